use std::cell::Cell;

use crate::class_parser::constants::AccessFlagField;
use crate::helper::has_flag;
use crate::vm::heap::ObjRef;
use crate::vm::value::Value;

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum FieldType {
    B,
    C,
    D,
    F,
    I,
    J,
    L(String),
    S,
    Z,
    A(Box<FieldType>), // [
    V,
}

impl FieldType {
    /// The zero value a static storage cell starts out with.
    pub fn default_value(&self) -> Value {
        match self {
            FieldType::J => Value::Long(0),
            FieldType::D => Value::Double(0.0),
            FieldType::F => Value::Float(0.0),
            FieldType::L(_) | FieldType::A(_) => Value::Ref(ObjRef::NULL),
            _ => Value::Int(0),
        }
    }

    /// The operand kind a value of this type occupies on the stack.
    pub fn value_kind(&self) -> &'static str {
        match self {
            FieldType::J => "long",
            FieldType::D => "double",
            FieldType::F => "float",
            FieldType::L(_) | FieldType::A(_) => "reference",
            FieldType::V => "void",
            _ => "int",
        }
    }
}

#[derive(Debug)]
pub struct Field {
    pub flag: u16,
    pub name: String,
    pub descriptor: FieldType,
    /// Static storage cell shared by all readers; unused for instance
    /// fields, whose storage lives in the object's property bag.
    pub static_value: Cell<Value>,
}

impl Field {
    pub fn new(flag: u16, name: String, descriptor: FieldType) -> Field {
        let static_value = Cell::new(descriptor.default_value());

        Field {
            flag,
            name,
            descriptor,
            static_value,
        }
    }

    pub fn is_static(&self) -> bool {
        has_flag(self.flag, AccessFlagField::ACC_STATIC)
    }
}

#[cfg(test)]
mod tests {
    use crate::class_parser::constants::AccessFlagField;
    use crate::vm::class::field::{Field, FieldType};
    use crate::vm::heap::ObjRef;
    use crate::vm::value::Value;

    #[test]
    fn static_cells_start_at_the_typed_zero() {
        let field = Field::new(
            AccessFlagField::ACC_STATIC as u16,
            "counter".to_string(),
            FieldType::J,
        );

        assert!(field.is_static());
        assert_eq!(field.static_value.get(), Value::Long(0));

        let reference = Field::new(
            0,
            "next".to_string(),
            FieldType::L("foo/Bar".to_string()),
        );
        assert_eq!(reference.static_value.get(), Value::Ref(ObjRef::NULL));
    }
}
