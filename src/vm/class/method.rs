use std::fmt::{Debug, Formatter};

use crate::class_parser::constants::AccessFlagMethod;
use crate::class_parser::types::LineNumber;
use crate::helper::has_flag;
use crate::vm::class::field::FieldType;
use crate::vm::class_loader::native::NativeFnPtr;

#[derive(Debug, PartialEq, Clone)]
pub struct MethodDescriptor {
    pub raw: String,
    pub parameters: Vec<FieldType>,
    pub ret: FieldType,
}

#[derive(Debug)]
pub struct Method {
    pub flag: u16,
    pub name: String,
    pub descriptor: MethodDescriptor,
    /// Operand-stack slots consumed by a call, the receiver slot included
    /// for instance methods.
    pub arg_slots: usize,
    pub body: MethodBody,
}

impl Method {
    pub fn is_static(&self) -> bool {
        has_flag(self.flag, AccessFlagMethod::ACC_STATIC)
    }

    pub fn signature(&self) -> String {
        format!("{}{}", self.name, self.descriptor.raw)
    }
}

#[derive(Debug)]
pub enum MethodBody {
    Bytecode(Code),
    Native(NativeMethod),
    /// Declared without code and without a native registration.
    Absent,
}

pub struct NativeMethod {
    pub fn_ptr: NativeFnPtr,
}

impl Debug for NativeMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native {:p}>", self.fn_ptr as *const ())
    }
}

#[derive(Debug)]
pub struct Code {
    pub max_stack: usize,
    pub max_locals: usize,
    pub code: Vec<u8>,
    /// Parsed but not yet consulted by control flow.
    pub exception_table: Vec<ExceptionHandler>,
    pub line_numbers: Vec<LineNumber>,
}

impl Code {
    /// Source line covering `pc`, when a LineNumberTable was present.
    pub fn line_for(&self, pc: usize) -> Option<u16> {
        self.line_numbers
            .iter()
            .take_while(|entry| entry.start_pc as usize <= pc)
            .last()
            .map(|entry| entry.line)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionHandler {
    pub start_pc: usize,
    pub end_pc: usize,
    pub handler_pc: usize,
    /// None encodes the catch-all entry (catch_type index 0).
    pub catch_type: Option<String>,
}
