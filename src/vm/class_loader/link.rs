//! Derivation of a runtime `Class` from a freshly decoded `ParsedClass`.

use log::debug;

use crate::class_parser::constant_pool::class_name_at;
use crate::class_parser::constants::{AccessFlagMethod, CpInfo};
use crate::class_parser::types::{CodeAttribute, MemberInfo, ParsedClass};
use crate::helper::has_flag;
use crate::vm::class::class::{Class, ClassOrigin};
use crate::vm::class::field::{Field, FieldType};
use crate::vm::class::method::{
    Code, ExceptionHandler, Method, MethodBody, MethodDescriptor, NativeMethod,
};
use crate::vm::class::name_parsers::argument_slots;
use crate::vm::class_loader::native;
use crate::vm::error::VmError;

pub fn derive_class(parsed: ParsedClass) -> Result<Class, VmError> {
    let pool = &parsed.constant_pool;

    let name = parsed.name()?.to_string();
    debug!(
        "linking {} (constant pool: {} entries)",
        name,
        pool.len()
    );

    let superclass = if parsed.super_class == 0 {
        None
    } else {
        Some(class_name_at(pool, parsed.super_class)?.to_string())
    };

    let interfaces = parsed
        .interfaces
        .iter()
        .map(|&index| class_name_at(pool, index).map(str::to_string))
        .collect::<Result<Vec<_>, _>>()?;

    let fields = parsed
        .fields
        .iter()
        .map(link_field)
        .collect::<Result<Vec<_>, _>>()?;

    let methods = parsed
        .methods
        .iter()
        .map(|info| link_method(&name, info, pool))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Class {
        name,
        flag: parsed.access_flags,
        origin: ClassOrigin::Decoded,
        superclass,
        interfaces,
        constant_pool: parsed.constant_pool,
        fields,
        methods,
    })
}

fn link_field(info: &MemberInfo) -> Result<Field, VmError> {
    let descriptor = FieldType::parse(&info.descriptor)?;

    Ok(Field::new(info.access_flags, info.name.clone(), descriptor))
}

fn link_method(class_name: &str, info: &MemberInfo, pool: &[CpInfo]) -> Result<Method, VmError> {
    let descriptor = MethodDescriptor::parse(&info.descriptor)?;
    let is_static = has_flag(info.access_flags, AccessFlagMethod::ACC_STATIC);
    let arg_slots = argument_slots(&info.descriptor, is_static)?;

    let body = if has_flag(info.access_flags, AccessFlagMethod::ACC_NATIVE) {
        let fn_ptr = native::lookup(class_name, &info.name, &info.descriptor).ok_or_else(|| {
            VmError::NativeNotRegistered {
                class: class_name.to_string(),
                name: info.name.clone(),
                descriptor: info.descriptor.clone(),
            }
        })?;
        MethodBody::Native(NativeMethod { fn_ptr })
    } else {
        match info.code() {
            Some(attribute) => MethodBody::Bytecode(link_code(attribute, pool)?),
            None => MethodBody::Absent,
        }
    };

    Ok(Method {
        flag: info.access_flags,
        name: info.name.clone(),
        descriptor,
        arg_slots,
        body,
    })
}

fn link_code(attribute: &CodeAttribute, pool: &[CpInfo]) -> Result<Code, VmError> {
    let exception_table = attribute
        .exception_table
        .iter()
        .map(|range| {
            let catch_type = if range.catch_type == 0 {
                None
            } else {
                Some(class_name_at(pool, range.catch_type)?.to_string())
            };

            Ok(ExceptionHandler {
                start_pc: range.start_pc as usize,
                end_pc: range.end_pc as usize,
                handler_pc: range.handler_pc as usize,
                catch_type,
            })
        })
        .collect::<Result<Vec<_>, VmError>>()?;

    Ok(Code {
        max_stack: attribute.max_stack as usize,
        max_locals: attribute.max_locals as usize,
        code: attribute.code.clone(),
        exception_table,
        line_numbers: attribute.line_numbers().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use crate::class_parser::constants::CpInfo;
    use crate::class_parser::types::{
        Attribute, CodeAttribute, ExceptionRange, LineNumber, MemberInfo, ParsedClass,
    };
    use crate::vm::class::class::ClassOrigin;
    use crate::vm::class::field::FieldType;
    use crate::vm::class::method::MethodBody;
    use crate::vm::class_loader::link::derive_class;
    use crate::vm::error::VmError;
    use crate::vm::value::Value;

    fn skeleton(fields: Vec<MemberInfo>, methods: Vec<MemberInfo>) -> ParsedClass {
        ParsedClass {
            minor_version: 0,
            major_version: 52,
            constant_pool: vec![
                CpInfo::Utf8("Sample".to_string()),           // 1
                CpInfo::Class(1),                             // 2
                CpInfo::Utf8("java/lang/Object".to_string()), // 3
                CpInfo::Class(3),                             // 4
                CpInfo::Utf8("java/lang/Iterable".to_string()), // 5
                CpInfo::Class(5),                             // 6
            ],
            access_flags: 0x0021,
            this_class: 2,
            super_class: 4,
            interfaces: vec![6],
            fields,
            methods,
            attributes: vec![],
        }
    }

    #[test]
    fn names_and_members_come_out_linked() {
        let parsed = skeleton(
            vec![MemberInfo {
                access_flags: 0x0008,
                name: "counter".to_string(),
                descriptor: "J".to_string(),
                attributes: vec![],
            }],
            vec![MemberInfo {
                access_flags: 0x0009,
                name: "run".to_string(),
                descriptor: "(I)J".to_string(),
                attributes: vec![Attribute::Code(CodeAttribute {
                    max_stack: 2,
                    max_locals: 1,
                    code: vec![9, 173], // lconst_0, lreturn
                    exception_table: vec![ExceptionRange {
                        start_pc: 0,
                        end_pc: 1,
                        handler_pc: 1,
                        catch_type: 0,
                    }],
                    attributes: vec![Attribute::LineNumberTable(vec![LineNumber {
                        start_pc: 0,
                        line: 3,
                    }])],
                })],
            }],
        );

        let class = derive_class(parsed).unwrap();

        assert_eq!(class.name, "Sample");
        assert_eq!(class.origin, ClassOrigin::Decoded);
        assert!(class.is_public());
        assert!(!class.is_interface());
        assert!(!class.is_abstract());
        assert_eq!(class.superclass.as_deref(), Some("java/lang/Object"));
        assert_eq!(class.interfaces, vec!["java/lang/Iterable".to_string()]);

        let field = class.find_field("counter").unwrap();
        assert!(field.is_static());
        assert_eq!(field.descriptor, FieldType::J);
        assert_eq!(field.static_value.get(), Value::Long(0));

        let (_, method) = class.find_method("run", "(I)J").unwrap();
        assert_eq!(method.arg_slots, 1);
        match &method.body {
            MethodBody::Bytecode(code) => {
                assert_eq!(code.code, vec![9, 173]);
                assert_eq!(code.exception_table.len(), 1);
                assert_eq!(code.exception_table[0].catch_type, None);
                assert_eq!(code.line_for(1), Some(3));
            }
            other => panic!("expected bytecode body, got {:?}", other),
        }
    }

    #[test]
    fn unregistered_natives_fail_to_link() {
        let parsed = skeleton(
            vec![],
            vec![MemberInfo {
                access_flags: 0x0109, // public static native
                name: "mystery".to_string(),
                descriptor: "()V".to_string(),
                attributes: vec![],
            }],
        );

        assert!(matches!(
            derive_class(parsed),
            Err(VmError::NativeNotRegistered { .. })
        ));
    }
}
