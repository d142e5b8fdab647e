use std::io::{Cursor, Read};

use thiserror::Error;

use crate::class_parser::be_reader::{read_bytes, BEReader};
use crate::class_parser::constant_pool::utf8_at;
use crate::class_parser::constants::{CpInfo, CpTag};
use crate::class_parser::types::{
    Attribute, CodeAttribute, ExceptionRange, InnerClass, LineNumber, MemberInfo, ParsedClass, U1,
    U2, U4,
};

pub mod constant_pool;
pub mod constants;
pub mod types;

mod be_reader;

const CLASS_MAGIC: U4 = 0xCAFE_BABE;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("not a class file (bad magic number)")]
    BadMagic,
    #[error("class file ends prematurely")]
    Truncated,
    #[error("unknown constant pool tag {0}")]
    UnknownConstantTag(u8),
    #[error("constant pool entry is not valid modified UTF-8")]
    BadUtf8,
    #[error("constant pool index {0} is out of range")]
    BadPoolIndex(U2),
    #[error("constant pool entry {index} is a {found}, expected {expected}")]
    UnexpectedEntry {
        index: U2,
        expected: &'static str,
        found: &'static str,
    },
    #[error("class file is longer than expected")]
    TrailingBytes,
}

fn parse_cp_info(reader: &mut impl Read, constant_pool: &mut Vec<CpInfo>) -> Result<(), ParseError> {
    use CpTag::*;

    let tag = U1::read(reader)?;
    let tag = CpTag::try_from(tag).map_err(|_| ParseError::UnknownConstantTag(tag))?;

    match tag {
        Utf8 => {
            let length = U2::read(reader)? as usize;
            let buf = read_bytes(reader, length)?;
            let text = std::string::String::from_utf8(buf).map_err(|_| ParseError::BadUtf8)?;
            constant_pool.push(CpInfo::Utf8(text));
        }
        Integer => constant_pool.push(CpInfo::Integer(i32::read(reader)?)),
        Float => constant_pool.push(CpInfo::Float(f32::read(reader)?)),
        Long => {
            constant_pool.push(CpInfo::Long(i64::read(reader)?));
            constant_pool.push(CpInfo::Hole);
        }
        Double => {
            constant_pool.push(CpInfo::Double(f64::read(reader)?));
            constant_pool.push(CpInfo::Hole);
        }
        Class => constant_pool.push(CpInfo::Class(U2::read(reader)?)),
        String => constant_pool.push(CpInfo::String(U2::read(reader)?)),
        Fieldref => constant_pool.push(CpInfo::Fieldref(U2::read(reader)?, U2::read(reader)?)),
        Methodref => constant_pool.push(CpInfo::Methodref(U2::read(reader)?, U2::read(reader)?)),
        InterfaceMethodref => {
            constant_pool.push(CpInfo::InterfaceMethodref(U2::read(reader)?, U2::read(reader)?))
        }
        NameAndType => {
            constant_pool.push(CpInfo::NameAndType(U2::read(reader)?, U2::read(reader)?))
        }
        MethodHandle => {
            constant_pool.push(CpInfo::MethodHandle(U1::read(reader)?, U2::read(reader)?))
        }
        MethodType => constant_pool.push(CpInfo::MethodType(U2::read(reader)?)),
        InvokeDynamic => {
            constant_pool.push(CpInfo::InvokeDynamic(U2::read(reader)?, U2::read(reader)?))
        }
    }

    Ok(())
}

fn parse_member_info(
    reader: &mut impl Read,
    constant_pool: &[CpInfo],
) -> Result<MemberInfo, ParseError> {
    let access_flags = U2::read(reader)?;
    let name_index = U2::read(reader)?;
    let descriptor_index = U2::read(reader)?;

    let name = utf8_at(constant_pool, name_index)?.to_string();
    let descriptor = utf8_at(constant_pool, descriptor_index)?.to_string();

    let attributes = parse_attribute_list(reader, constant_pool)?;

    Ok(MemberInfo {
        access_flags,
        name,
        descriptor,
        attributes,
    })
}

fn parse_attribute_list(
    reader: &mut impl Read,
    constant_pool: &[CpInfo],
) -> Result<Vec<Attribute>, ParseError> {
    let count = U2::read(reader)?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        attributes.push(parse_attribute_info(reader, constant_pool)?);
    }

    Ok(attributes)
}

fn parse_attribute_info(
    reader: &mut impl Read,
    constant_pool: &[CpInfo],
) -> Result<Attribute, ParseError> {
    let attribute_name_index = U2::read(reader)?;
    let attribute_length = U4::read(reader)?;
    let data = read_bytes(reader, attribute_length as usize)?;

    let name = utf8_at(constant_pool, attribute_name_index)?;
    let payload = &mut Cursor::new(&data[..]);

    Ok(match name {
        "Code" => Attribute::Code(parse_code_attribute(payload, constant_pool)?),
        "LineNumberTable" => {
            let count = U2::read(payload)?;
            let mut lines = Vec::with_capacity(count as usize);
            for _ in 0..count {
                lines.push(LineNumber {
                    start_pc: U2::read(payload)?,
                    line: U2::read(payload)?,
                });
            }
            Attribute::LineNumberTable(lines)
        }
        "SourceFile" => {
            let sourcefile_index = U2::read(payload)?;
            Attribute::SourceFile(utf8_at(constant_pool, sourcefile_index)?.to_string())
        }
        "InnerClasses" => {
            let count = U2::read(payload)?;
            let mut classes = Vec::with_capacity(count as usize);
            for _ in 0..count {
                classes.push(InnerClass {
                    inner_class_info: U2::read(payload)?,
                    outer_class_info: U2::read(payload)?,
                    inner_name: U2::read(payload)?,
                    access_flags: U2::read(payload)?,
                });
            }
            Attribute::InnerClasses(classes)
        }
        _ => Attribute::Unknown {
            name: name.to_string(),
            data,
        },
    })
}

fn parse_code_attribute(
    reader: &mut impl Read,
    constant_pool: &[CpInfo],
) -> Result<CodeAttribute, ParseError> {
    let max_stack = U2::read(reader)?;
    let max_locals = U2::read(reader)?;

    let code_length = U4::read(reader)? as usize;
    let code = read_bytes(reader, code_length)?;

    let exception_table_length = U2::read(reader)?;
    let mut exception_table = Vec::with_capacity(exception_table_length as usize);
    for _ in 0..exception_table_length {
        exception_table.push(ExceptionRange {
            start_pc: U2::read(reader)?,
            end_pc: U2::read(reader)?,
            handler_pc: U2::read(reader)?,
            catch_type: U2::read(reader)?,
        });
    }

    let attributes = parse_attribute_list(reader, constant_pool)?;

    Ok(CodeAttribute {
        max_stack,
        max_locals,
        code,
        exception_table,
        attributes,
    })
}

pub fn parse_class(buf: &[u8]) -> Result<ParsedClass, ParseError> {
    let mut cursor = Cursor::new(buf);

    let magic = U4::read(&mut cursor)?;
    if magic != CLASS_MAGIC {
        return Err(ParseError::BadMagic);
    }

    let minor_version = U2::read(&mut cursor)?;
    let major_version = U2::read(&mut cursor)?;

    let constant_pool_count = U2::read(&mut cursor)?.saturating_sub(1);
    let mut constant_pool = Vec::with_capacity(constant_pool_count as usize);
    while constant_pool.len() < constant_pool_count as usize {
        parse_cp_info(&mut cursor, &mut constant_pool)?;
    }

    let access_flags = U2::read(&mut cursor)?;
    let this_class = U2::read(&mut cursor)?;
    let super_class = U2::read(&mut cursor)?;

    let interfaces_count = U2::read(&mut cursor)?;
    let mut interfaces = Vec::with_capacity(interfaces_count as usize);
    for _ in 0..interfaces_count {
        interfaces.push(U2::read(&mut cursor)?);
    }

    let fields_count = U2::read(&mut cursor)?;
    let mut fields = Vec::with_capacity(fields_count as usize);
    for _ in 0..fields_count {
        fields.push(parse_member_info(&mut cursor, &constant_pool)?);
    }

    let methods_count = U2::read(&mut cursor)?;
    let mut methods = Vec::with_capacity(methods_count as usize);
    for _ in 0..methods_count {
        methods.push(parse_member_info(&mut cursor, &constant_pool)?);
    }

    let attributes = parse_attribute_list(&mut cursor, &constant_pool)?;

    if (cursor.position() as usize) < buf.len() {
        return Err(ParseError::TrailingBytes);
    }

    Ok(ParsedClass {
        minor_version,
        major_version,
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use crate::class_parser::constants::CpInfo;
    use crate::class_parser::types::Attribute;
    use crate::class_parser::{parse_class, ParseError};

    fn push_utf8(buf: &mut Vec<u8>, text: &str) {
        buf.push(1);
        buf.extend_from_slice(&(text.len() as u16).to_be_bytes());
        buf.extend_from_slice(text.as_bytes());
    }

    fn push_class(buf: &mut Vec<u8>, name_index: u16) {
        buf.push(7);
        buf.extend_from_slice(&name_index.to_be_bytes());
    }

    /// A class file equivalent to `class Foo {}` with one static method
    /// `main([Ljava/lang/String;)V` whose body is a single `return`.
    fn minimal_class_bytes() -> Vec<u8> {
        let mut buf = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];

        buf.extend_from_slice(&8u16.to_be_bytes()); // pool count (7 entries)
        push_utf8(&mut buf, "Foo"); // 1
        push_class(&mut buf, 1); // 2
        push_utf8(&mut buf, "java/lang/Object"); // 3
        push_class(&mut buf, 3); // 4
        push_utf8(&mut buf, "main"); // 5
        push_utf8(&mut buf, "([Ljava/lang/String;)V"); // 6
        push_utf8(&mut buf, "Code"); // 7

        buf.extend_from_slice(&0x0021u16.to_be_bytes()); // access flags
        buf.extend_from_slice(&2u16.to_be_bytes()); // this_class
        buf.extend_from_slice(&4u16.to_be_bytes()); // super_class
        buf.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        buf.extend_from_slice(&0u16.to_be_bytes()); // fields

        buf.extend_from_slice(&1u16.to_be_bytes()); // methods
        buf.extend_from_slice(&0x0009u16.to_be_bytes()); // public static
        buf.extend_from_slice(&5u16.to_be_bytes()); // name_index
        buf.extend_from_slice(&6u16.to_be_bytes()); // descriptor_index
        buf.extend_from_slice(&1u16.to_be_bytes()); // attribute count
        buf.extend_from_slice(&7u16.to_be_bytes()); // "Code"
        buf.extend_from_slice(&13u32.to_be_bytes()); // attribute length
        buf.extend_from_slice(&0u16.to_be_bytes()); // max_stack
        buf.extend_from_slice(&1u16.to_be_bytes()); // max_locals
        buf.extend_from_slice(&1u32.to_be_bytes()); // code length
        buf.push(177); // return
        buf.extend_from_slice(&0u16.to_be_bytes()); // exception table
        buf.extend_from_slice(&0u16.to_be_bytes()); // code attributes

        buf.extend_from_slice(&0u16.to_be_bytes()); // class attributes
        buf
    }

    #[test]
    fn decodes_and_rederives_its_own_name() {
        let parsed = parse_class(&minimal_class_bytes()).unwrap();

        assert_eq!(parsed.name().unwrap(), "Foo");
        assert_eq!(parsed.major_version, 52);

        let main = &parsed.methods[0];
        assert_eq!(main.name, "main");
        assert_eq!(main.descriptor, "([Ljava/lang/String;)V");

        let code = main.code().unwrap();
        assert_eq!(code.max_locals, 1);
        assert_eq!(code.code, vec![177]);
    }

    #[test]
    fn wrong_magic_produces_no_class() {
        let mut buf = minimal_class_bytes();
        buf[..4].copy_from_slice(&[0, 0, 0, 0]);

        assert_eq!(parse_class(&buf).unwrap_err(), ParseError::BadMagic);
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let buf = minimal_class_bytes();

        assert_eq!(parse_class(&buf[..10]).unwrap_err(), ParseError::Truncated);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut buf = minimal_class_bytes();
        buf.push(0);

        assert_eq!(parse_class(&buf).unwrap_err(), ParseError::TrailingBytes);
    }

    #[test]
    fn unknown_constant_tag_is_rejected() {
        let mut buf = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        buf.extend_from_slice(&2u16.to_be_bytes());
        buf.push(99);

        assert_eq!(
            parse_class(&buf).unwrap_err(),
            ParseError::UnknownConstantTag(99)
        );
    }

    #[test]
    fn wide_pool_entries_leave_a_hole() {
        let mut buf = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        buf.extend_from_slice(&3u16.to_be_bytes()); // two slots
        buf.push(5); // Long
        buf.extend_from_slice(&(-1i64).to_be_bytes());
        // class trailer: flags, this (bogus but undereferenced), super,
        // interfaces, fields, methods, attributes
        for half in [0u16, 1, 0, 0, 0, 0, 0] {
            buf.extend_from_slice(&half.to_be_bytes());
        }

        let parsed = parse_class(&buf).unwrap();
        assert_eq!(parsed.constant_pool[0], CpInfo::Long(-1));
        assert_eq!(parsed.constant_pool[1], CpInfo::Hole);
    }

    #[test]
    fn unrecognized_attributes_are_retained() {
        // pool: Utf8 "Whatever", Utf8 "x"; one class attribute of that name
        let mut buf = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        buf.extend_from_slice(&3u16.to_be_bytes());
        push_utf8(&mut buf, "Whatever"); // 1
        push_class(&mut buf, 1); // 2 (reused as this_class)
        for half in [0u16, 2, 0, 0, 0, 0] {
            buf.extend_from_slice(&half.to_be_bytes());
        }
        buf.extend_from_slice(&1u16.to_be_bytes()); // one attribute
        buf.extend_from_slice(&1u16.to_be_bytes()); // name = "Whatever"
        buf.extend_from_slice(&2u32.to_be_bytes());
        buf.extend_from_slice(&[0xAB, 0xCD]);

        let parsed = parse_class(&buf).unwrap();
        match &parsed.attributes[0] {
            Attribute::Unknown { name, data } => {
                assert_eq!(name, "Whatever");
                assert_eq!(data, &[0xAB, 0xCD]);
            }
            other => panic!("expected unknown attribute, got {:?}", other),
        }
    }
}
