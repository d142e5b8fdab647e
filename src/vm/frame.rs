use std::rc::Rc;

use crate::vm::class::class::Class;
use crate::vm::class::method::{Method, MethodBody};
use crate::vm::stack::{LocalSlots, OperandStack};

/// Execution context of one active method invocation. Owns its operand and
/// local storage exclusively; both die with the frame.
pub struct Frame {
    pub class: Rc<Class>,
    pub method_index: usize,
    pub pc: usize,
    pub locals: LocalSlots,
    pub operands: OperandStack,
}

impl Frame {
    pub fn new(class: Rc<Class>, method_index: usize) -> Frame {
        let (max_locals, max_stack) = {
            let method = &class.methods[method_index];
            match &method.body {
                MethodBody::Bytecode(code) => (code.max_locals, code.max_stack),
                // native frames only ever hold the incoming arguments
                _ => (method.arg_slots, 0),
            }
        };

        Frame {
            class,
            method_index,
            pc: 0,
            locals: LocalSlots::new(max_locals),
            operands: OperandStack::new(max_stack),
        }
    }

    pub fn method(&self) -> &Method {
        &self.class.methods[self.method_index]
    }
}
