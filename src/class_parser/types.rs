use crate::class_parser::constant_pool::class_name_at;
use crate::class_parser::constants::CpInfo;
use crate::class_parser::ParseError;

pub type U1 = u8;
pub type U2 = u16;
pub type U4 = u32;
pub type U8 = u64;

/// A field or method record with name and descriptor already resolved from
/// the constant pool.
#[derive(Debug)]
pub struct MemberInfo {
    pub access_flags: U2,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<Attribute>,
}

impl MemberInfo {
    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::Code(code) => Some(code),
            _ => None,
        })
    }
}

#[derive(Debug)]
pub enum Attribute {
    Code(CodeAttribute),
    LineNumberTable(Vec<LineNumber>),
    SourceFile(String),
    InnerClasses(Vec<InnerClass>),
    /// Unrecognized attribute names are retained unparsed.
    Unknown { name: String, data: Vec<u8> },
}

#[derive(Debug)]
pub struct CodeAttribute {
    pub max_stack: U2,
    pub max_locals: U2,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionRange>,
    pub attributes: Vec<Attribute>,
}

impl CodeAttribute {
    pub fn line_numbers(&self) -> &[LineNumber] {
        self.attributes
            .iter()
            .find_map(|a| match a {
                Attribute::LineNumberTable(lines) => Some(lines.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ExceptionRange {
    pub start_pc: U2,
    pub end_pc: U2,
    pub handler_pc: U2,
    pub catch_type: U2,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LineNumber {
    pub start_pc: U2,
    pub line: U2,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InnerClass {
    pub inner_class_info: U2,
    pub outer_class_info: U2,
    pub inner_name: U2,
    pub access_flags: U2,
}

#[derive(Debug)]
pub struct ParsedClass {
    pub minor_version: U2,
    pub major_version: U2,
    pub constant_pool: Vec<CpInfo>, // of length constant_pool_count-1
    pub access_flags: U2,
    pub this_class: U2,
    pub super_class: U2,
    pub interfaces: Vec<U2>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<Attribute>,
}

impl ParsedClass {
    /// The class's own name, derived through this_class -> Class -> Utf8.
    pub fn name(&self) -> Result<&str, ParseError> {
        class_name_at(&self.constant_pool, self.this_class)
    }
}
