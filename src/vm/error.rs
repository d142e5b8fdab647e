use thiserror::Error;

use crate::class_parser::ParseError;

#[derive(Debug, Error)]
pub enum VmError {
    #[error("class not found: {0}")]
    ClassNotFound(String),
    #[error("no such method: {class}.{name}{descriptor}")]
    NoSuchMethod {
        class: String,
        name: String,
        descriptor: String,
    },
    #[error("no such field: {class}.{name}")]
    NoSuchField { class: String, name: String },
    #[error("unimplemented opcode 0x{opcode:02x} at pc {pc}")]
    UnimplementedOpcode { opcode: u8, pc: usize },
    #[error("constant pool entry {index} cannot be loaded as an operand")]
    UnsupportedConstant { index: u16 },
    #[error("expected {expected} but found {found}")]
    ValueKind {
        expected: &'static str,
        found: &'static str,
    },
    #[error("operand stack overflow (max {max} slots)")]
    StackOverflow { max: usize },
    #[error("operand stack underflow")]
    StackUnderflow,
    #[error("local slot {0} holds no readable value")]
    BadLocalSlot(usize),
    #[error("invalid descriptor: {0}")]
    BadDescriptor(String),
    #[error("branch target out of range at pc {pc}")]
    BadBranch { pc: usize },
    #[error("program counter {pc} outside method body")]
    PcOutOfBounds { pc: usize },
    #[error("attempt to invoke abstract method {class}.{name}")]
    AbstractMethodCall { class: String, name: String },
    #[error("no native implementation registered for {class}.{name}{descriptor}")]
    NativeNotRegistered {
        class: String,
        name: String,
        descriptor: String,
    },
    #[error("no active frame")]
    NoActiveFrame,
    #[error("malformed class: {0}")]
    MalformedClass(#[from] ParseError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
