//! Runtime-essential classes that exist without class-file bytes: the boot
//! registry served by `BootClassFinder`, and the hand-assembled carrier
//! class that kicks execution off through the ordinary invocation machinery.

use std::rc::Rc;

use crate::class_parser::constants::{
    AccessFlagClass, AccessFlagField, AccessFlagMethod, CpInfo,
};
use crate::helper::has_flag;
use crate::vm::class::class::{Class, ClassOrigin};
use crate::vm::class::field::{Field, FieldType};
use crate::vm::class::method::{
    Code, Method, MethodBody, MethodDescriptor, NativeMethod,
};
use crate::vm::class::name_parsers::argument_slots;
use crate::vm::class_loader::native::{NativeCtx, NativeFnPtr};
use crate::vm::class_loader::ClassFinder;
use crate::vm::error::VmError;
use crate::vm::heap::ObjRef;
use crate::vm::instructions::Opcode;
use crate::vm::value::Value;

pub const MAIN_NAME: &str = "main";
pub const MAIN_DESCRIPTOR: &str = "([Ljava/lang/String;)V";

/// Serves the fixed built-in registry of native classes.
pub struct BootClassFinder;

impl ClassFinder for BootClassFinder {
    fn find_class(&self, name: &str) -> Result<Option<Class>, VmError> {
        Ok(match name {
            "java/lang/Object" => Some(object_class()?),
            "java/lang/Iterable" => Some(iterable_class()?),
            "java/lang/System" => Some(system_class()?),
            "java/io/PrintStream" => Some(print_stream_class()?),
            _ => None,
        })
    }
}

fn native_method(
    flag: u16,
    name: &str,
    descriptor: &str,
    fn_ptr: NativeFnPtr,
) -> Result<Method, VmError> {
    let is_static = has_flag(flag, AccessFlagMethod::ACC_STATIC);
    let arg_slots = argument_slots(descriptor, is_static)?;

    Ok(Method {
        flag,
        name: name.to_string(),
        descriptor: MethodDescriptor::parse(descriptor)?,
        arg_slots,
        body: MethodBody::Native(NativeMethod { fn_ptr }),
    })
}

fn boot_class(name: &str, fields: Vec<Field>, methods: Vec<Method>) -> Class {
    Class {
        name: name.to_string(),
        flag: AccessFlagClass::ACC_PUBLIC as u16,
        origin: ClassOrigin::Boot,
        superclass: (name != "java/lang/Object").then(|| "java/lang/Object".to_string()),
        interfaces: vec![],
        constant_pool: vec![],
        fields,
        methods,
    }
}

fn object_class() -> Result<Class, VmError> {
    Ok(boot_class(
        "java/lang/Object",
        vec![],
        vec![native_method(
            AccessFlagMethod::ACC_PUBLIC as u16,
            "<init>",
            "()V",
            object_init,
        )?],
    ))
}

fn object_init(
    _: &mut NativeCtx,
    _: &Rc<Class>,
    _: &[Value],
) -> Result<Option<Value>, VmError> {
    Ok(None)
}

fn iterable_class() -> Result<Class, VmError> {
    Ok(boot_class(
        "java/lang/Iterable",
        vec![],
        vec![
            native_method(
                AccessFlagMethod::ACC_PUBLIC as u16,
                "<init>",
                "()V",
                object_init,
            )?,
            native_method(
                AccessFlagMethod::ACC_PUBLIC as u16,
                "iterator",
                "()Ljava/util/Iterator;",
                iterable_iterator,
            )?,
        ],
    ))
}

fn iterable_iterator(
    _: &mut NativeCtx,
    _: &Rc<Class>,
    _: &[Value],
) -> Result<Option<Value>, VmError> {
    Ok(Some(Value::Ref(ObjRef::NULL)))
}

fn system_class() -> Result<Class, VmError> {
    let out = Field::new(
        AccessFlagField::ACC_PUBLIC as u16
            | AccessFlagField::ACC_STATIC as u16
            | AccessFlagField::ACC_FINAL as u16,
        "out".to_string(),
        FieldType::L("java/io/PrintStream".to_string()),
    );

    Ok(boot_class(
        "java/lang/System",
        vec![out],
        vec![native_method(
            AccessFlagMethod::ACC_STATIC as u16,
            "<clinit>",
            "()V",
            system_clinit,
        )?],
    ))
}

/// The one piece of static state the boot registry sets up: `System.out`
/// becomes a live console-output object.
fn system_clinit(
    ctx: &mut NativeCtx,
    class: &Rc<Class>,
    _: &[Value],
) -> Result<Option<Value>, VmError> {
    let outcome = ctx.classes.load("java/io/PrintStream")?;
    let stream_class = outcome
        .class
        .ok_or_else(|| VmError::ClassNotFound("java/io/PrintStream".to_string()))?;

    let stream = ctx.heap.alloc(stream_class);

    let out = class
        .find_field("out")
        .ok_or_else(|| VmError::NoSuchField {
            class: class.name.clone(),
            name: "out".to_string(),
        })?;
    out.static_value.set(Value::Ref(stream));

    Ok(None)
}

fn print_stream_class() -> Result<Class, VmError> {
    use crate::vm::class_loader::native::io;

    let public = AccessFlagMethod::ACC_PUBLIC as u16;

    Ok(boot_class(
        "java/io/PrintStream",
        vec![],
        vec![
            native_method(public, "println", "(J)V", io::println_long)?,
            native_method(public, "println", "(I)V", io::println_int)?,
            native_method(public, "println", "(D)V", io::println_double)?,
        ],
    ))
}

/// Builds the synthetic carrier class whose static initializer brings up the
/// user's entry point:
///
/// ```text
/// aconst_null
/// invokestatic #6    // <main-class>.main([Ljava/lang/String;)V
/// halt
/// ```
pub fn entry_class(main_class: &str) -> Result<Class, VmError> {
    let constant_pool = vec![
        CpInfo::Utf8(main_class.replace('.', "/")),      // 1
        CpInfo::Utf8(MAIN_NAME.to_string()),             // 2
        CpInfo::Utf8(MAIN_DESCRIPTOR.to_string()),       // 3
        CpInfo::Class(1),                                // 4
        CpInfo::NameAndType(2, 3),                       // 5
        CpInfo::Methodref(4, 5),                         // 6
    ];

    let code = vec![
        Opcode::aconst_null as u8,
        Opcode::invokestatic as u8,
        0,
        6,
        Opcode::halt as u8,
    ];

    let bootstrap = Method {
        flag: AccessFlagMethod::ACC_STATIC as u16,
        name: "<clinit>".to_string(),
        descriptor: MethodDescriptor::parse("()V")?,
        arg_slots: 0,
        body: MethodBody::Bytecode(Code {
            max_stack: 1,
            max_locals: 0,
            code,
            exception_table: vec![],
            line_numbers: vec![],
        }),
    };

    Ok(Class {
        name: "<bootstrap>".to_string(),
        flag: 0,
        origin: ClassOrigin::Synthetic,
        superclass: None,
        interfaces: vec![],
        constant_pool,
        fields: vec![],
        methods: vec![bootstrap],
    })
}
