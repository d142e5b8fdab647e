use crate::vm::error::VmError;
use crate::vm::heap::ObjRef;

/// A single execution-stack cell. Tagging the cell instead of storing raw
/// bytes makes operand widths a type-level property: a `Long` can only be
/// popped as a `Long`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Ref(ObjRef),
}

impl Value {
    /// Slot width in the classic 4-byte accounting: longs and doubles take
    /// two slots, everything else one.
    pub fn width(&self) -> usize {
        match self {
            Value::Long(_) | Value::Double(_) => 2,
            _ => 1,
        }
    }

    pub fn is_wide(&self) -> bool {
        self.width() == 2
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Ref(_) => "reference",
        }
    }

    pub fn as_int(self) -> Result<i32, VmError> {
        match self {
            Value::Int(v) => Ok(v),
            other => Err(other.kind_error("int")),
        }
    }

    pub fn as_long(self) -> Result<i64, VmError> {
        match self {
            Value::Long(v) => Ok(v),
            other => Err(other.kind_error("long")),
        }
    }

    pub fn as_double(self) -> Result<f64, VmError> {
        match self {
            Value::Double(v) => Ok(v),
            other => Err(other.kind_error("double")),
        }
    }

    fn kind_error(self, expected: &'static str) -> VmError {
        VmError::ValueKind {
            expected,
            found: self.kind(),
        }
    }
}
