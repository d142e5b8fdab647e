//! Native-method table. Decoded classes that declare `ACC_NATIVE` methods
//! resolve their bodies here at link time; the boot classes wire the same
//! handlers in directly.

use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::OnceCell;

use crate::vm::class::class::Class;
use crate::vm::class_loader::ClassRegistry;
use crate::vm::error::VmError;
use crate::vm::heap::Heap;
use crate::vm::value::Value;

/// What a native body sees of the machine besides its arguments and owning
/// class.
pub struct NativeCtx<'a> {
    pub heap: &'a mut Heap,
    pub classes: &'a mut ClassRegistry,
}

/// A native method body. `Some(value)` acts as an implicit value return,
/// `None` as an implicit void return.
pub type NativeFnPtr =
    fn(&mut NativeCtx, &Rc<Class>, &[Value]) -> Result<Option<Value>, VmError>;

#[derive(Eq, Hash, PartialEq)]
pub struct NativeMethodRef {
    pub class_name: String,
    pub method_name: String,
    pub descriptor: String,
}

static NATIVE_FN_STORE: OnceCell<HashMap<NativeMethodRef, NativeFnPtr>> = OnceCell::new();

pub fn lookup(class_name: &str, method_name: &str, descriptor: &str) -> Option<NativeFnPtr> {
    let store = NATIVE_FN_STORE.get_or_init(init_native_store);

    store
        .get(&NativeMethodRef {
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            descriptor: descriptor.to_string(),
        })
        .copied()
}

fn init_native_store() -> HashMap<NativeMethodRef, NativeFnPtr> {
    let mut store: HashMap<NativeMethodRef, NativeFnPtr> = Default::default();

    store.insert(
        NativeMethodRef {
            class_name: "java/io/PrintStream".to_string(),
            method_name: "println".to_string(),
            descriptor: "(J)V".to_string(),
        },
        io::println_long,
    );

    store.insert(
        NativeMethodRef {
            class_name: "java/io/PrintStream".to_string(),
            method_name: "println".to_string(),
            descriptor: "(I)V".to_string(),
        },
        io::println_int,
    );

    store.insert(
        NativeMethodRef {
            class_name: "java/io/PrintStream".to_string(),
            method_name: "println".to_string(),
            descriptor: "(D)V".to_string(),
        },
        io::println_double,
    );

    store
}

pub mod io {
    use std::rc::Rc;

    use crate::vm::class::class::Class;
    use crate::vm::class_loader::native::NativeCtx;
    use crate::vm::error::VmError;
    use crate::vm::value::Value;

    // args[0] is the receiving stream object

    pub fn println_long(
        _: &mut NativeCtx,
        _: &Rc<Class>,
        args: &[Value],
    ) -> Result<Option<Value>, VmError> {
        println!("{}", args[1].as_long()?);
        Ok(None)
    }

    pub fn println_int(
        _: &mut NativeCtx,
        _: &Rc<Class>,
        args: &[Value],
    ) -> Result<Option<Value>, VmError> {
        println!("{}", args[1].as_int()?);
        Ok(None)
    }

    pub fn println_double(
        _: &mut NativeCtx,
        _: &Rc<Class>,
        args: &[Value],
    ) -> Result<Option<Value>, VmError> {
        let value = args[1].as_double()?;
        let rendered = value.to_string();

        // match the usual decimal rendering of whole doubles
        if rendered.contains('.') {
            println!("{}", rendered);
        } else {
            println!("{}.0", rendered);
        }
        Ok(None)
    }
}
