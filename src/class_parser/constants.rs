use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::class_parser::types::{U1, U2};

#[derive(TryFromPrimitive, Debug, Copy, Clone, PartialEq)]
#[repr(u8)]
pub enum CpTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    Fieldref = 9,
    Methodref = 10,
    InterfaceMethodref = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    InvokeDynamic = 18,
}

/// One constant-pool slot. The pool is 1-based; storage omits slot 0 and
/// lookups subtract one. `Long` and `Double` entries own two consecutive
/// slots, the second stored as `Hole`.
#[derive(Debug, Clone, PartialEq)]
pub enum CpInfo {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(U2),
    Class(U2),
    Fieldref(U2, U2),
    Methodref(U2, U2),
    InterfaceMethodref(U2, U2),
    NameAndType(U2, U2),
    MethodHandle(U1, U2),
    MethodType(U2),
    InvokeDynamic(U2, U2),
    Hole,
}

impl CpInfo {
    pub const fn entry_kind(&self) -> &'static str {
        match self {
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::String(_) => "String",
            CpInfo::Class(_) => "Class",
            CpInfo::Fieldref(_, _) => "Fieldref",
            CpInfo::Methodref(_, _) => "Methodref",
            CpInfo::InterfaceMethodref(_, _) => "InterfaceMethodref",
            CpInfo::NameAndType(_, _) => "NameAndType",
            CpInfo::MethodHandle(_, _) => "MethodHandle",
            CpInfo::MethodType(_) => "MethodType",
            CpInfo::InvokeDynamic(_, _) => "InvokeDynamic",
            CpInfo::Hole => "Hole",
        }
    }
}

#[derive(IntoPrimitive, Debug, Copy, Clone)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum AccessFlagClass {
    ACC_PUBLIC = 0x0001,
    ACC_FINAL = 0x0010,
    ACC_SUPER = 0x0020,
    ACC_INTERFACE = 0x0200,
    ACC_ABSTRACT = 0x0400,
    ACC_SYNTHETIC = 0x1000,
    ACC_ANNOTATION = 0x2000,
    ACC_ENUM = 0x4000,
}

#[derive(IntoPrimitive, Debug, Copy, Clone)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum AccessFlagField {
    ACC_PUBLIC = 0x0001,
    ACC_PRIVATE = 0x0002,
    ACC_PROTECTED = 0x0004,
    ACC_STATIC = 0x0008,
    ACC_FINAL = 0x0010,
    ACC_VOLATILE = 0x0040,
    ACC_TRANSIENT = 0x0080,
    ACC_SYNTHETIC = 0x1000,
    ACC_ENUM = 0x4000,
}

#[derive(IntoPrimitive, Debug, Copy, Clone)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum AccessFlagMethod {
    ACC_PUBLIC = 0x0001,
    ACC_PRIVATE = 0x0002,
    ACC_PROTECTED = 0x0004,
    ACC_STATIC = 0x0008,
    ACC_FINAL = 0x0010,
    ACC_SYNCHRONIZED = 0x0020,
    ACC_BRIDGE = 0x0040,
    ACC_VARARGS = 0x0080,
    ACC_NATIVE = 0x0100,
    ACC_ABSTRACT = 0x0400,
    ACC_STRICT = 0x0800,
    ACC_SYNTHETIC = 0x1000,
}
