use crate::class_parser::constants::{AccessFlagClass, CpInfo};
use crate::helper::has_flag;
use crate::vm::class::field::Field;
use crate::vm::class::method::Method;

/// Runtime representation of a loaded class. Immutable after construction
/// except for the static storage cells owned by its fields.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub flag: u16,
    pub origin: ClassOrigin,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub constant_pool: Vec<CpInfo>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

/// Where a class came from. The synthetic bootstrap carrier is an ordinary
/// `Class` tagged here rather than a subclass of anything.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ClassOrigin {
    /// Decoded from class-file bytes found on the classpath.
    Decoded,
    /// Built-in class whose methods are native handlers.
    Boot,
    /// Hand-assembled entry-point carrier.
    Synthetic,
}

impl Class {
    pub fn is_public(&self) -> bool {
        has_flag(self.flag, AccessFlagClass::ACC_PUBLIC)
    }

    pub fn is_interface(&self) -> bool {
        has_flag(self.flag, AccessFlagClass::ACC_INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        has_flag(self.flag, AccessFlagClass::ACC_ABSTRACT)
    }

    /// The method table is keyed by name plus raw descriptor.
    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<(usize, &Method)> {
        self.methods
            .iter()
            .enumerate()
            .find(|(_, m)| m.name == name && m.descriptor.raw == descriptor)
    }

    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Index of `<clinit>()V` when this class declares one.
    pub fn clinit_index(&self) -> Option<usize> {
        self.find_method("<clinit>", "()V")
            .filter(|(_, m)| m.is_static())
            .map(|(index, _)| index)
    }
}
