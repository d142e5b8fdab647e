use std::rc::Rc;

use log::{debug, error, trace};
use smallvec::SmallVec;

use crate::class_parser::constant_pool::{class_name_at, entry_at, member_ref_at};
use crate::class_parser::constants::CpInfo;
use crate::vm::class::class::Class;
use crate::vm::class::field::FieldType;
use crate::vm::class::method::{Code, MethodBody};
use crate::vm::class_loader::bootstrap::entry_class;
use crate::vm::class_loader::native::{NativeCtx, NativeFnPtr};
use crate::vm::class_loader::ClassRegistry;
use crate::vm::error::VmError;
use crate::vm::frame::Frame;
use crate::vm::heap::{Heap, ObjRef};
use crate::vm::instructions::Opcode;
use crate::vm::value::Value;

const FRAME_STACK_DEPTH: usize = 32;

/// What one dispatch iteration decided. `RetryInstruction` is the
/// class-load-pending outcome: an initializer frame was pushed and the
/// triggering instruction, its pc untouched, re-executes once that frame
/// returns.
pub enum StepOutcome {
    Continue,
    RetryInstruction,
    Halt,
}

enum Loaded {
    Ready(Rc<Class>),
    /// The class's static initializer was just pushed as the top frame.
    Pending,
}

pub struct Interpreter {
    classes: ClassRegistry,
    heap: Heap,
    frames: SmallVec<[Frame; FRAME_STACK_DEPTH]>,
}

impl Interpreter {
    pub fn new(classes: ClassRegistry) -> Interpreter {
        Interpreter {
            classes,
            heap: Heap::new(),
            frames: SmallVec::new(),
        }
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Synthesizes the bootstrap carrier for `main_class` and interprets
    /// until the halt opcode or a fatal error.
    pub fn run_main(&mut self, main_class: &str) -> Result<(), VmError> {
        let entry = Rc::new(entry_class(main_class)?);
        self.frames.push(Frame::new(entry, 0));
        self.run()
    }

    fn run(&mut self) -> Result<(), VmError> {
        loop {
            match self.step() {
                Ok(StepOutcome::Halt) => return Ok(()),
                Ok(_) => continue,
                Err(e) => {
                    self.trace_frames();
                    return Err(e);
                }
            }
        }
    }

    /// Frame-by-frame trace emitted once for any fatal condition.
    fn trace_frames(&self) {
        error!("call stack ({} frames, innermost first):", self.frames.len());
        for frame in self.frames.iter().rev() {
            let method = frame.method();
            match &method.body {
                MethodBody::Bytecode(code) => match code.line_for(frame.pc) {
                    Some(line) => error!(
                        "  at {}.{} (pc {}, line {})",
                        frame.class.name,
                        method.signature(),
                        frame.pc,
                        line
                    ),
                    None => error!(
                        "  at {}.{} (pc {})",
                        frame.class.name,
                        method.signature(),
                        frame.pc
                    ),
                },
                _ => error!("  at {}.{} (native)", frame.class.name, method.signature()),
            }
        }
    }

    fn step(&mut self) -> Result<StepOutcome, VmError> {
        let (class, method_index, pc) = {
            let frame = self.top()?;
            (Rc::clone(&frame.class), frame.method_index, frame.pc)
        };

        match &class.methods[method_index].body {
            MethodBody::Native(native) => {
                let fn_ptr = native.fn_ptr;
                self.execute_native(fn_ptr, &class, method_index)
            }
            MethodBody::Absent => Err(VmError::AbstractMethodCall {
                class: class.name.clone(),
                name: class.methods[method_index].name.clone(),
            }),
            MethodBody::Bytecode(code) => {
                let byte = *code
                    .code
                    .get(pc)
                    .ok_or(VmError::PcOutOfBounds { pc })?;
                let opcode = Opcode::try_from(byte)
                    .map_err(|_| VmError::UnimplementedOpcode { opcode: byte, pc })?;

                trace!(
                    "{}.{} pc={} {}",
                    class.name,
                    class.methods[method_index].name,
                    pc,
                    opcode
                );

                self.execute(opcode, &class, code, pc)
            }
        }
    }

    fn execute(
        &mut self,
        opcode: Opcode,
        class: &Rc<Class>,
        code: &Code,
        pc: usize,
    ) -> Result<StepOutcome, VmError> {
        use Opcode::*;

        match opcode {
            aconst_null => {
                self.push(Value::Ref(ObjRef::NULL))?;
                self.advance(1)
            }
            iconst_m1 | iconst_0 | iconst_1 | iconst_2 | iconst_3 | iconst_4 | iconst_5 => {
                self.push(Value::Int(opcode as u8 as i32 - 3))?;
                self.advance(1)
            }
            lconst_0 | lconst_1 => {
                self.push(Value::Long((opcode as u8 - lconst_0 as u8) as i64))?;
                self.advance(1)
            }
            dconst_0 | dconst_1 => {
                self.push(Value::Double((opcode as u8 - dconst_0 as u8) as f64))?;
                self.advance(1)
            }
            bipush => {
                let value = operand_u8(code, pc, 1)? as i8;
                self.push(Value::Int(value as i32))?;
                self.advance(2)
            }
            sipush => {
                let value = operand_u16(code, pc, 1)? as i16;
                self.push(Value::Int(value as i32))?;
                self.advance(3)
            }
            ldc => {
                let index = operand_u8(code, pc, 1)? as u16;
                let value = match entry_at(&class.constant_pool, index)? {
                    CpInfo::Integer(v) => Value::Int(*v),
                    CpInfo::Float(v) => Value::Float(*v),
                    _ => return Err(VmError::UnsupportedConstant { index }),
                };
                self.push(value)?;
                self.advance(2)
            }
            ldc2_w => {
                let index = operand_u16(code, pc, 1)?;
                let value = match entry_at(&class.constant_pool, index)? {
                    CpInfo::Long(v) => Value::Long(*v),
                    CpInfo::Double(v) => Value::Double(*v),
                    _ => return Err(VmError::UnsupportedConstant { index }),
                };
                self.push(value)?;
                self.advance(3)
            }

            iload | lload | aload => {
                let index = operand_u8(code, pc, 1)? as usize;
                let expected = match opcode {
                    iload => "int",
                    lload => "long",
                    _ => "reference",
                };
                self.load_local(index, expected)?;
                self.advance(2)
            }
            iload_0 | iload_1 | iload_2 | iload_3 => {
                self.load_local(opcode as usize - iload_0 as usize, "int")?;
                self.advance(1)
            }
            lload_0 | lload_1 | lload_2 | lload_3 => {
                self.load_local(opcode as usize - lload_0 as usize, "long")?;
                self.advance(1)
            }
            aload_0 | aload_1 | aload_2 | aload_3 => {
                self.load_local(opcode as usize - aload_0 as usize, "reference")?;
                self.advance(1)
            }

            istore | lstore | astore => {
                let index = operand_u8(code, pc, 1)? as usize;
                let expected = match opcode {
                    istore => "int",
                    lstore => "long",
                    _ => "reference",
                };
                self.store_local(index, expected)?;
                self.advance(2)
            }
            istore_0 | istore_1 | istore_2 | istore_3 => {
                self.store_local(opcode as usize - istore_0 as usize, "int")?;
                self.advance(1)
            }
            lstore_0 | lstore_1 | lstore_2 | lstore_3 => {
                self.store_local(opcode as usize - lstore_0 as usize, "long")?;
                self.advance(1)
            }
            astore_0 | astore_1 | astore_2 | astore_3 => {
                self.store_local(opcode as usize - astore_0 as usize, "reference")?;
                self.advance(1)
            }

            pop => {
                self.top_mut()?.operands.pop_narrow()?;
                self.advance(1)
            }
            pop2 => {
                self.top_mut()?.operands.pop_two_slots()?;
                self.advance(1)
            }
            dup => {
                self.top_mut()?.operands.dup()?;
                self.advance(1)
            }

            iadd => {
                let operands = &mut self.top_mut()?.operands;
                let b = operands.pop_int()?;
                let a = operands.pop_int()?;
                operands.push(Value::Int(a.wrapping_add(b)))?;
                self.advance(1)
            }
            ladd => {
                let operands = &mut self.top_mut()?.operands;
                let b = operands.pop_long()?;
                let a = operands.pop_long()?;
                operands.push(Value::Long(a.wrapping_add(b)))?;
                self.advance(1)
            }
            imul => {
                let operands = &mut self.top_mut()?.operands;
                let b = operands.pop_int()?;
                let a = operands.pop_int()?;
                operands.push(Value::Int(a.wrapping_mul(b)))?;
                self.advance(1)
            }
            iinc => {
                let index = operand_u8(code, pc, 1)? as usize;
                let delta = operand_u8(code, pc, 2)? as i8 as i32;
                let frame = self.top_mut()?;
                let value = frame.locals.get(index)?.as_int()?;
                frame.locals.set(index, Value::Int(value.wrapping_add(delta)))?;
                self.advance(3)
            }

            i2l => self.convert(|v| Ok(Value::Long(v.as_int()? as i64))),
            i2f => self.convert(|v| Ok(Value::Float(v.as_int()? as f32))),
            i2d => self.convert(|v| Ok(Value::Double(v.as_int()? as f64))),
            l2i => self.convert(|v| Ok(Value::Int(v.as_long()? as i32))),
            l2f => self.convert(|v| Ok(Value::Float(v.as_long()? as f32))),
            l2d => self.convert(|v| Ok(Value::Double(v.as_long()? as f64))),
            i2b => self.convert(|v| Ok(Value::Int(v.as_int()? as i8 as i32))),
            i2c => self.convert(|v| Ok(Value::Int(v.as_int()? as u16 as i32))),
            i2s => self.convert(|v| Ok(Value::Int(v.as_int()? as i16 as i32))),

            dcmpl => {
                let operands = &mut self.top_mut()?.operands;
                let b = operands.pop_double()?;
                let a = operands.pop_double()?;
                // the `l` variant: NaN compares as less-than
                let result = if a > b {
                    1
                } else if a == b {
                    0
                } else {
                    -1
                };
                operands.push(Value::Int(result))?;
                self.advance(1)
            }
            ifne => {
                let offset = operand_u16(code, pc, 1)? as i16;
                let value = self.top_mut()?.operands.pop_int()?;
                if value != 0 {
                    self.branch(code, pc, offset)
                } else {
                    self.advance(3)
                }
            }
            goto => {
                let offset = operand_u16(code, pc, 1)? as i16;
                self.branch(code, pc, offset)
            }

            getstatic => {
                let index = operand_u16(code, pc, 1)?;
                let member = member_ref_at(&class.constant_pool, index)?;
                let (owner, field_name) =
                    (member.class_name.to_string(), member.name.to_string());

                let target = match self.class_for_execution(&owner)? {
                    Loaded::Ready(target) => target,
                    Loaded::Pending => return Ok(StepOutcome::RetryInstruction),
                };
                let field = target.find_field(&field_name).ok_or(VmError::NoSuchField {
                    class: owner,
                    name: field_name,
                })?;

                self.push(field.static_value.get())?;
                self.advance(3)
            }
            putstatic => {
                let index = operand_u16(code, pc, 1)?;
                let member = member_ref_at(&class.constant_pool, index)?;
                let (owner, field_name) =
                    (member.class_name.to_string(), member.name.to_string());

                let target = match self.class_for_execution(&owner)? {
                    Loaded::Ready(target) => target,
                    Loaded::Pending => return Ok(StepOutcome::RetryInstruction),
                };
                let field = target.find_field(&field_name).ok_or(VmError::NoSuchField {
                    class: owner,
                    name: field_name,
                })?;

                // pop with the width the field descriptor implies
                let value = self.top_mut()?.operands.pop()?;
                check_assignable(&field.descriptor, value)?;
                field.static_value.set(value);
                self.advance(3)
            }

            invokevirtual | invokespecial | invokestatic => self.invoke(class, code, pc, 3),
            invokeinterface => {
                // u16 index, then an interface-argument-count byte and a
                // reserved zero byte; both are carried but skipped
                operand_u8(code, pc, 3)?;
                operand_u8(code, pc, 4)?;
                self.invoke(class, code, pc, 5)
            }

            new => {
                let index = operand_u16(code, pc, 1)?;
                let name = class_name_at(&class.constant_pool, index)?.to_string();

                let target = match self.class_for_execution(&name)? {
                    Loaded::Ready(target) => target,
                    Loaded::Pending => return Ok(StepOutcome::RetryInstruction),
                };

                let reference = self.heap.alloc(target);
                self.push(Value::Ref(reference))?;
                self.advance(3)
            }

            ireturn => {
                let value = self.top_mut()?.operands.pop_int()?;
                self.return_value(Some(Value::Int(value)))
            }
            lreturn => {
                let value = self.top_mut()?.operands.pop_long()?;
                self.return_value(Some(Value::Long(value)))
            }
            dreturn => {
                let value = self.top_mut()?.operands.pop_double()?;
                self.return_value(Some(Value::Double(value)))
            }
            _return => self.return_value(None),

            halt => Ok(StepOutcome::Halt),
        }
    }

    /// Loads `name` through the registry and, on a true miss of a class that
    /// declares a static initializer, pushes the initializer frame instead
    /// of returning the class. Registration happened before the push, so the
    /// retried instruction finds the class cached and proceeds.
    fn class_for_execution(&mut self, name: &str) -> Result<Loaded, VmError> {
        let outcome = self.classes.load(name)?;
        let class = outcome
            .class
            .ok_or_else(|| VmError::ClassNotFound(name.to_string()))?;

        if !outcome.cached {
            if let Some(clinit) = class.clinit_index() {
                debug!("running static initializer of {}", class.name);
                self.frames.push(Frame::new(class, clinit));
                return Ok(Loaded::Pending);
            }
        }

        Ok(Loaded::Ready(class))
    }

    fn invoke(
        &mut self,
        class: &Rc<Class>,
        code: &Code,
        pc: usize,
        length: usize,
    ) -> Result<StepOutcome, VmError> {
        let index = operand_u16(code, pc, 1)?;
        let member = member_ref_at(&class.constant_pool, index)?;
        let (owner, name, descriptor) = (
            member.class_name.to_string(),
            member.name.to_string(),
            member.descriptor.to_string(),
        );

        let target = match self.class_for_execution(&owner)? {
            Loaded::Ready(target) => target,
            Loaded::Pending => return Ok(StepOutcome::RetryInstruction),
        };

        let (method_index, method) =
            target
                .find_method(&name, &descriptor)
                .ok_or(VmError::NoSuchMethod {
                    class: owner,
                    name,
                    descriptor,
                })?;
        let arg_slots = method.arg_slots;

        let mut callee = Frame::new(Rc::clone(&target), method_index);
        self.copy_arguments(&mut callee, arg_slots)?;

        // the caller resumes past the call site once the callee returns
        self.advance(length)?;
        self.frames.push(callee);
        Ok(StepOutcome::Continue)
    }

    /// Copies `arg_slots` worth of values from the caller's operand stack
    /// into the callee's leading local slots.
    fn copy_arguments(&mut self, callee: &mut Frame, arg_slots: usize) -> Result<(), VmError> {
        let caller = self.top_mut()?;

        let mut popped: SmallVec<[Value; 8]> = SmallVec::new();
        let mut consumed = 0;
        while consumed < arg_slots {
            let value = caller.operands.pop()?;
            consumed += value.width();
            popped.push(value);
        }
        if consumed != arg_slots {
            return Err(VmError::ValueKind {
                expected: "arguments matching the descriptor's slot count",
                found: "a misaligned wide value",
            });
        }

        // values came off right-to-left; slots fill left-to-right
        let mut slot = arg_slots;
        for value in popped {
            slot -= value.width();
            callee.locals.set(slot, value)?;
        }

        Ok(())
    }

    /// Runs a native frame to completion: arguments are read back out of the
    /// locals they were copied into, the handler runs synchronously, and its
    /// optional result behaves like an implicit return instruction.
    fn execute_native(
        &mut self,
        fn_ptr: NativeFnPtr,
        class: &Rc<Class>,
        method_index: usize,
    ) -> Result<StepOutcome, VmError> {
        let arg_slots = class.methods[method_index].arg_slots;

        let args = {
            let frame = self.top()?;
            let mut args: SmallVec<[Value; 8]> = SmallVec::new();
            let mut slot = 0;
            while slot < arg_slots {
                let value = frame.locals.get(slot)?;
                slot += value.width();
                args.push(value);
            }
            args
        };

        let result = {
            let mut ctx = NativeCtx {
                heap: &mut self.heap,
                classes: &mut self.classes,
            };
            fn_ptr(&mut ctx, class, &args)?
        };

        self.frames.pop();
        self.transfer_return(result)
    }

    fn return_value(&mut self, value: Option<Value>) -> Result<StepOutcome, VmError> {
        self.frames.pop().ok_or(VmError::NoActiveFrame)?;
        self.transfer_return(value)
    }

    fn transfer_return(&mut self, value: Option<Value>) -> Result<StepOutcome, VmError> {
        match self.frames.last_mut() {
            Some(caller) => {
                if let Some(value) = value {
                    caller.operands.push(value)?;
                }
                Ok(StepOutcome::Continue)
            }
            // the bottom frame returned; nothing left to execute
            None => Ok(StepOutcome::Halt),
        }
    }

    fn load_local(&mut self, index: usize, expected: &'static str) -> Result<(), VmError> {
        let frame = self.top_mut()?;
        let value = frame.locals.get(index)?;
        if value.kind() != expected {
            return Err(VmError::ValueKind {
                expected,
                found: value.kind(),
            });
        }
        frame.operands.push(value)
    }

    fn store_local(&mut self, index: usize, expected: &'static str) -> Result<(), VmError> {
        let frame = self.top_mut()?;
        let value = frame.operands.pop()?;
        if value.kind() != expected {
            return Err(VmError::ValueKind {
                expected,
                found: value.kind(),
            });
        }
        frame.locals.set(index, value)
    }

    fn convert(
        &mut self,
        conversion: fn(Value) -> Result<Value, VmError>,
    ) -> Result<StepOutcome, VmError> {
        let operands = &mut self.top_mut()?.operands;
        let value = operands.pop()?;
        operands.push(conversion(value)?)?;
        self.advance(1)
    }

    fn branch(&mut self, code: &Code, pc: usize, offset: i16) -> Result<StepOutcome, VmError> {
        // relative to the branch instruction's own address
        let target = pc as i64 + offset as i64;
        if target < 0 || target as usize >= code.code.len() {
            return Err(VmError::BadBranch { pc });
        }

        self.top_mut()?.pc = target as usize;
        Ok(StepOutcome::Continue)
    }

    fn advance(&mut self, length: usize) -> Result<StepOutcome, VmError> {
        self.top_mut()?.pc += length;
        Ok(StepOutcome::Continue)
    }

    fn push(&mut self, value: Value) -> Result<(), VmError> {
        self.top_mut()?.operands.push(value)
    }

    fn top(&self) -> Result<&Frame, VmError> {
        self.frames.last().ok_or(VmError::NoActiveFrame)
    }

    fn top_mut(&mut self) -> Result<&mut Frame, VmError> {
        self.frames.last_mut().ok_or(VmError::NoActiveFrame)
    }
}

fn operand_u8(code: &Code, pc: usize, offset: usize) -> Result<u8, VmError> {
    code.code
        .get(pc + offset)
        .copied()
        .ok_or(VmError::PcOutOfBounds { pc: pc + offset })
}

fn operand_u16(code: &Code, pc: usize, offset: usize) -> Result<u16, VmError> {
    let high = operand_u8(code, pc, offset)?;
    let low = operand_u8(code, pc, offset + 1)?;
    Ok(u16::from_be_bytes([high, low]))
}

/// The operand kind a field descriptor accepts, wide widths included.
fn check_assignable(descriptor: &FieldType, value: Value) -> Result<(), VmError> {
    let expected = descriptor.value_kind();
    if value.kind() != expected {
        return Err(VmError::ValueKind {
            expected,
            found: value.kind(),
        });
    }
    Ok(())
}
