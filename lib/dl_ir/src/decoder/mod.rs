//! Instruction decoder: lifts bytecode instructions into IR statements.
//!
//! Each instruction family has its own [`Handler`]; [`handler_for`] is the
//! dispatch table. Handlers allocate locals through the register file,
//! append statements to the body builder and, when typing is enabled,
//! record constraints and seeds on the operand positions of what they
//! emitted.

mod arith;
mod arrays;
mod branch;
mod compare;
mod consts;
mod exits;
mod fields;
mod invoke;
mod monitor;
mod moves;
mod objects;
mod switch;

pub use branch::{ConditionalJump, GotoHandler, IfTest, IfTestZ, JumpHandler};

use crate::builder::{BodyBuilder, TrapRange};
use crate::errors::{IrError, IrResult};
use crate::ir::{Body, IdentitySource, LocalId, Slot, Stmt, StmtId, Target, ValueBox};
use crate::registers::RegisterFile;
use crate::repo::{MethodDef, SymbolTable};
use crate::typing::{ConstraintCollector, RegType};
use crate::unit::LiftOptions;
use dl_bytecode::code::Code;
use dl_bytecode::instrs::{Instr, Instruction, LabeledInstr};
use dl_bytecode::registers::Reg;
use dl_bytecode::types::Type;
use dl_bytecode::Addr;

/// Lifts the instructions of one family.
pub trait Handler: Sync {
    /// Appends the statements implementing `instr` to the body being built.
    ///
    /// # Errors
    ///
    /// Fails when the instruction does not belong to the handler family, or
    /// when its operands are inconsistent with the method frame or with the
    /// symbols they reference.
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()>;
}

/// A statement whose result may be claimed by the next instruction.
#[derive(Debug, Clone)]
pub(crate) struct PendingResult {
    pub stmt: StmtId,
    pub ty: Type,
}

/// Everything handlers share while lifting one body.
pub struct LiftContext<'a> {
    symbols: &'a dyn SymbolTable,
    method: &'a MethodDef,
    code: &'a Code,
    registers: RegisterFile,
    builder: BodyBuilder,
    typer: Option<ConstraintCollector>,
    addr: Addr,
    result: Option<PendingResult>,
    last_result: Option<PendingResult>,
}

impl<'a> LiftContext<'a> {
    #[must_use]
    pub fn new(
        method: &'a MethodDef,
        code: &'a Code,
        symbols: &'a dyn SymbolTable,
        options: LiftOptions,
    ) -> Self {
        Self {
            symbols,
            method,
            code,
            registers: RegisterFile::new(code.registers_size),
            builder: BodyBuilder::new(),
            typer: options.typing().then(ConstraintCollector::new),
            addr: Addr::entry(),
            result: None,
            last_result: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn symbols(&self) -> &'a dyn SymbolTable {
        self.symbols
    }

    #[inline]
    #[must_use]
    pub const fn method(&self) -> &'a MethodDef {
        self.method
    }

    #[inline]
    #[must_use]
    pub const fn code(&self) -> &'a Code {
        self.code
    }

    /// The constraint collector, `None` when typing is disabled.
    pub fn typer(&mut self) -> Option<&mut ConstraintCollector> {
        self.typer.as_mut()
    }

    pub fn seed<H: Into<RegType>>(&mut self, at: ValueBox, hint: H) {
        if let Some(typer) = self.typer() {
            typer.seed(at, hint);
        }
    }

    pub fn constrain(&mut self, a: ValueBox, b: ValueBox) {
        if let Some(typer) = self.typer() {
            typer.constrain(a, b);
        }
    }

    /// Local of a single-slot register operand.
    pub fn local(&mut self, reg: Reg) -> IrResult<LocalId> {
        self.registers.local(reg, self.addr)
    }

    /// Local of a register pair operand.
    pub fn wide(&mut self, reg: Reg) -> IrResult<LocalId> {
        self.registers.wide(reg, self.addr)
    }

    /// Local of a register operand holding a value of type `ty`.
    pub fn sized(&mut self, reg: Reg, ty: &Type) -> IrResult<LocalId> {
        self.registers.sized(reg, ty.slots(), self.addr)
    }

    /// Local of a register operand spanning `slots` registers.
    pub fn with_slots(&mut self, reg: Reg, slots: usize) -> IrResult<LocalId> {
        self.registers.sized(reg, slots, self.addr)
    }

    pub fn push(&mut self, instr: &LabeledInstr, stmt: Stmt) -> StmtId {
        self.builder.push(instr.addr, stmt, instr.instr.can_throw())
    }

    /// Target of a branch `offset` code units away from the current
    /// instruction.
    pub fn placeholder(&mut self, offset: i32) -> IrResult<Target> {
        self.builder.placeholder(self.addr, offset)
    }

    /// Target of the instruction following `instr`.
    pub fn fallthrough(&mut self, instr: &LabeledInstr) -> Target {
        self.builder.placeholder_at(instr.next_addr())
    }

    /// Position of the local defined by statement `id`.
    #[must_use]
    pub fn def_box(&self, id: StmtId) -> Option<ValueBox> {
        let boxes = self.builder.stmt(id)?.boxes();
        match boxes.last() {
            Some(Slot::Def(_)) => Some(ValueBox::new(id, boxes.len() - 1)),
            _ => None,
        }
    }

    pub(crate) fn set_result(&mut self, stmt: StmtId, ty: Type) {
        self.result = Some(PendingResult { stmt, ty });
    }

    pub(crate) fn take_result(&mut self) -> Option<PendingResult> {
        self.last_result.take()
    }

    pub(crate) fn stmt(&self, id: StmtId) -> Option<&Stmt> {
        self.builder.stmt(id)
    }

    pub(crate) fn replace(&mut self, id: StmtId, stmt: Stmt) {
        self.builder.replace(id, stmt);
    }

    /// Returns a decoding error about the instruction being lifted.
    pub(crate) fn bad_format<S: Into<String>>(&self, instr: &LabeledInstr, reason: S) -> IrError {
        IrError::bad_format(instr.addr, instr.instr.mnemonic(), reason)
    }

    fn entry(&mut self) -> IrResult<()> {
        let method = self.method;
        let proto = &method.method.proto;
        let expected = proto.params_slots() + usize::from(!method.is_static());
        if expected != usize::from(self.code.ins_size) {
            return Err(IrError::ArityMismatch {
                addr: Addr::entry(),
                expected,
                found: usize::from(self.code.ins_size),
            });
        }

        let mut reg = self.code.first_in_register();
        if !method.is_static() {
            let local = self.local(Reg::from(reg))?;
            let class = method.method.class.clone();
            let id = self.builder.push_entry(Stmt::Identity {
                local,
                source: IdentitySource::This(class.clone()),
            });
            self.seed(ValueBox::new(id, 0), class);
            reg += 1;
        }
        for (i, param) in proto.params.iter().enumerate() {
            let local = self.sized(Reg::from(reg), param)?;
            let id = self.builder.push_entry(Stmt::Identity {
                local,
                source: IdentitySource::Parameter(i, param.clone()),
            });
            self.seed(ValueBox::new(id, 0), param);
            // bounded by ins_size, itself a u16
            reg += param.slots() as u16;
        }
        Ok(())
    }

    fn trap_ranges(&self) -> IrResult<Vec<TrapRange>> {
        let mut ranges = Vec::new();
        for item in &self.code.tries {
            for (type_idx, handler) in &item.handler.catches {
                ranges.push(TrapRange {
                    start: item.start,
                    end: item.end(),
                    handler: *handler,
                    exception: Some(self.symbols.type_of(*type_idx)?.clone()),
                });
            }
            if let Some(handler) = item.handler.catch_all {
                ranges.push(TrapRange {
                    start: item.start,
                    end: item.end(),
                    handler,
                    exception: None,
                });
            }
        }
        Ok(ranges)
    }

    fn finish(self) -> IrResult<(Body, Option<ConstraintCollector>)> {
        let traps = self.trap_ranges()?;
        let body = self.builder.link(
            self.method.method.clone(),
            self.registers.into_locals(),
            &traps,
        )?;
        Ok((body, self.typer))
    }
}

/// Does nothing; payload pseudo-instructions are read by the instructions
/// referencing them.
pub struct NopHandler;

impl Handler for NopHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        match instr.instr() {
            Instr::Nop => {
                cx.push(instr, Stmt::Nop);
                Ok(())
            }
            Instr::PackedSwitchPayload { .. }
            | Instr::SparseSwitchPayload { .. }
            | Instr::FillArrayDataPayload { .. } => Ok(()),
            _ => Err(cx.bad_format(instr, "not a nop or a payload")),
        }
    }
}

/// Hint required from a value used where a value of type `ty` is expected.
///
/// Any subtype may be used where a reference is expected, so uses only
/// demand a reference; definitions give the concrete class.
pub(crate) fn use_hint(ty: &Type) -> RegType {
    if ty.is_reference() {
        RegType::Reference
    } else {
        RegType::Concrete(ty.clone())
    }
}

/// Returns the handler of the family `instr` belongs to.
#[must_use]
pub fn handler_for(instr: &Instr) -> &'static dyn Handler {
    match instr {
        Instr::Nop
        | Instr::PackedSwitchPayload { .. }
        | Instr::SparseSwitchPayload { .. }
        | Instr::FillArrayDataPayload { .. } => &NopHandler,

        Instr::Move(..)
        | Instr::MoveFrom16(..)
        | Instr::Move16(..)
        | Instr::MoveWide(..)
        | Instr::MoveWideFrom16(..)
        | Instr::MoveWide16(..)
        | Instr::MoveObject(..)
        | Instr::MoveObjectFrom16(..)
        | Instr::MoveObject16(..) => &moves::MoveHandler,
        Instr::MoveResult(..) | Instr::MoveResultWide(..) | Instr::MoveResultObject(..) => {
            &moves::MoveResultHandler
        }
        Instr::MoveException(..) => &moves::MoveExceptionHandler,

        Instr::ReturnVoid | Instr::Return(..) | Instr::ReturnWide(..) | Instr::ReturnObject(..) => {
            &exits::ReturnHandler
        }
        Instr::Throw(..) => &exits::ThrowHandler,

        Instr::Const4(..)
        | Instr::Const16(..)
        | Instr::Const(..)
        | Instr::ConstHigh16(..)
        | Instr::ConstWide16(..)
        | Instr::ConstWide32(..)
        | Instr::ConstWide(..)
        | Instr::ConstWideHigh16(..) => &consts::ConstHandler,

        Instr::ConstString(..)
        | Instr::ConstStringJumbo(..)
        | Instr::ConstClass(..)
        | Instr::ConstMethodHandle(..)
        | Instr::ConstMethodType(..)
        | Instr::CheckCast(..)
        | Instr::InstanceOf(..)
        | Instr::NewInstance(..) => &objects::ObjectHandler,

        Instr::MonitorEnter(..) | Instr::MonitorExit(..) => &monitor::MonitorHandler,

        Instr::ArrayLength(..)
        | Instr::NewArray(..)
        | Instr::FilledNewArray(..)
        | Instr::FilledNewArrayRange(..)
        | Instr::FillArrayData(..)
        | Instr::Aget(..)
        | Instr::AgetWide(..)
        | Instr::AgetObject(..)
        | Instr::AgetBoolean(..)
        | Instr::AgetByte(..)
        | Instr::AgetChar(..)
        | Instr::AgetShort(..)
        | Instr::Aput(..)
        | Instr::AputWide(..)
        | Instr::AputObject(..)
        | Instr::AputBoolean(..)
        | Instr::AputByte(..)
        | Instr::AputChar(..)
        | Instr::AputShort(..) => &arrays::ArrayHandler,

        Instr::Goto(..) | Instr::Goto16(..) | Instr::Goto32(..) => &GotoHandler,
        Instr::PackedSwitch(..) | Instr::SparseSwitch(..) => &switch::SwitchHandler,
        Instr::IfEq(..)
        | Instr::IfNe(..)
        | Instr::IfLt(..)
        | Instr::IfGe(..)
        | Instr::IfGt(..)
        | Instr::IfLe(..) => &JumpHandler(IfTest),
        Instr::IfEqz(..)
        | Instr::IfNez(..)
        | Instr::IfLtz(..)
        | Instr::IfGez(..)
        | Instr::IfGtz(..)
        | Instr::IfLez(..) => &JumpHandler(IfTestZ),

        Instr::CmplFloat(..)
        | Instr::CmpgFloat(..)
        | Instr::CmplDouble(..)
        | Instr::CmpgDouble(..)
        | Instr::CmpLong(..) => &compare::CompareHandler,

        Instr::Iget(..)
        | Instr::IgetWide(..)
        | Instr::IgetObject(..)
        | Instr::IgetBoolean(..)
        | Instr::IgetByte(..)
        | Instr::IgetChar(..)
        | Instr::IgetShort(..)
        | Instr::Iput(..)
        | Instr::IputWide(..)
        | Instr::IputObject(..)
        | Instr::IputBoolean(..)
        | Instr::IputByte(..)
        | Instr::IputChar(..)
        | Instr::IputShort(..)
        | Instr::Sget(..)
        | Instr::SgetWide(..)
        | Instr::SgetObject(..)
        | Instr::SgetBoolean(..)
        | Instr::SgetByte(..)
        | Instr::SgetChar(..)
        | Instr::SgetShort(..)
        | Instr::Sput(..)
        | Instr::SputWide(..)
        | Instr::SputObject(..)
        | Instr::SputBoolean(..)
        | Instr::SputByte(..)
        | Instr::SputChar(..)
        | Instr::SputShort(..) => &fields::FieldHandler,

        Instr::InvokeVirtual(..)
        | Instr::InvokeSuper(..)
        | Instr::InvokeDirect(..)
        | Instr::InvokeStatic(..)
        | Instr::InvokeInterface(..)
        | Instr::InvokeVirtualRange(..)
        | Instr::InvokeSuperRange(..)
        | Instr::InvokeDirectRange(..)
        | Instr::InvokeStaticRange(..)
        | Instr::InvokeInterfaceRange(..)
        | Instr::InvokePolymorphic(..)
        | Instr::InvokePolymorphicRange(..)
        | Instr::InvokeCustom(..)
        | Instr::InvokeCustomRange(..) => &invoke::InvokeHandler,

        Instr::NegInt(..)
        | Instr::NotInt(..)
        | Instr::NegLong(..)
        | Instr::NotLong(..)
        | Instr::NegFloat(..)
        | Instr::NegDouble(..)
        | Instr::IntToLong(..)
        | Instr::IntToFloat(..)
        | Instr::IntToDouble(..)
        | Instr::LongToInt(..)
        | Instr::LongToFloat(..)
        | Instr::LongToDouble(..)
        | Instr::FloatToInt(..)
        | Instr::FloatToLong(..)
        | Instr::FloatToDouble(..)
        | Instr::DoubleToInt(..)
        | Instr::DoubleToLong(..)
        | Instr::DoubleToFloat(..)
        | Instr::IntToByte(..)
        | Instr::IntToChar(..)
        | Instr::IntToShort(..)
        | Instr::AddInt(..)
        | Instr::SubInt(..)
        | Instr::MulInt(..)
        | Instr::DivInt(..)
        | Instr::RemInt(..)
        | Instr::AndInt(..)
        | Instr::OrInt(..)
        | Instr::XorInt(..)
        | Instr::ShlInt(..)
        | Instr::ShrInt(..)
        | Instr::UshrInt(..)
        | Instr::AddLong(..)
        | Instr::SubLong(..)
        | Instr::MulLong(..)
        | Instr::DivLong(..)
        | Instr::RemLong(..)
        | Instr::AndLong(..)
        | Instr::OrLong(..)
        | Instr::XorLong(..)
        | Instr::ShlLong(..)
        | Instr::ShrLong(..)
        | Instr::UshrLong(..)
        | Instr::AddFloat(..)
        | Instr::SubFloat(..)
        | Instr::MulFloat(..)
        | Instr::DivFloat(..)
        | Instr::RemFloat(..)
        | Instr::AddDouble(..)
        | Instr::SubDouble(..)
        | Instr::MulDouble(..)
        | Instr::DivDouble(..)
        | Instr::RemDouble(..)
        | Instr::AddInt2addr(..)
        | Instr::SubInt2addr(..)
        | Instr::MulInt2addr(..)
        | Instr::DivInt2addr(..)
        | Instr::RemInt2addr(..)
        | Instr::AndInt2addr(..)
        | Instr::OrInt2addr(..)
        | Instr::XorInt2addr(..)
        | Instr::ShlInt2addr(..)
        | Instr::ShrInt2addr(..)
        | Instr::UshrInt2addr(..)
        | Instr::AddLong2addr(..)
        | Instr::SubLong2addr(..)
        | Instr::MulLong2addr(..)
        | Instr::DivLong2addr(..)
        | Instr::RemLong2addr(..)
        | Instr::AndLong2addr(..)
        | Instr::OrLong2addr(..)
        | Instr::XorLong2addr(..)
        | Instr::ShlLong2addr(..)
        | Instr::ShrLong2addr(..)
        | Instr::UshrLong2addr(..)
        | Instr::AddFloat2addr(..)
        | Instr::SubFloat2addr(..)
        | Instr::MulFloat2addr(..)
        | Instr::DivFloat2addr(..)
        | Instr::RemFloat2addr(..)
        | Instr::AddDouble2addr(..)
        | Instr::SubDouble2addr(..)
        | Instr::MulDouble2addr(..)
        | Instr::DivDouble2addr(..)
        | Instr::RemDouble2addr(..)
        | Instr::AddIntLit16(..)
        | Instr::RsubInt(..)
        | Instr::MulIntLit16(..)
        | Instr::DivIntLit16(..)
        | Instr::RemIntLit16(..)
        | Instr::AndIntLit16(..)
        | Instr::OrIntLit16(..)
        | Instr::XorIntLit16(..)
        | Instr::AddIntLit8(..)
        | Instr::RsubIntLit8(..)
        | Instr::MulIntLit8(..)
        | Instr::DivIntLit8(..)
        | Instr::RemIntLit8(..)
        | Instr::AndIntLit8(..)
        | Instr::OrIntLit8(..)
        | Instr::XorIntLit8(..)
        | Instr::ShlIntLit8(..)
        | Instr::ShrIntLit8(..)
        | Instr::UshrIntLit8(..) => &arith::ArithHandler,
    }
}

/// Decodes the body of `method`, returning the linked body and, when
/// typing is enabled, the constraints collected on it.
pub fn decode_method(
    method: &MethodDef,
    symbols: &dyn SymbolTable,
    options: LiftOptions,
) -> IrResult<(Body, Option<ConstraintCollector>)> {
    if !method.is_concrete() {
        return Err(IrError::NonConcreteBody(method.signature()));
    }
    let code = method
        .code()
        .ok_or_else(|| IrError::NoCode(method.signature()))?;
    log::debug!("decoding {}", method.signature());

    let mut cx = LiftContext::new(method, code, symbols, options);
    cx.entry()?;
    for instr in code.iter_instructions() {
        cx.addr = instr.addr;
        cx.last_result = cx.result.take();
        log::trace!("{}: {}", instr.addr, instr.instr.mnemonic());
        handler_for(&instr.instr).lift(instr, &mut cx)?;
    }
    cx.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CmpOp, Constant, Expr, Place, Value};
    use crate::repo::AccessFlags;
    use crate::testing::{method, pools, static_method};
    use crate::typing::Constraint;
    use crate::lift_method;
    use dl_bytecode::code::{CatchHandler, TryItem};
    use dl_bytecode::pools::Index;
    use dl_bytecode::registers::RegList;

    fn r(n: u8) -> Reg {
        Reg::from(n)
    }

    fn decode(method: &MethodDef) -> IrResult<(Body, Option<ConstraintCollector>)> {
        decode_method(method, &pools(), LiftOptions::default())
    }

    fn body_of(descriptor: &str, registers: u16, instrs: &[Instr]) -> Body {
        decode(&static_method(descriptor, registers, instrs)).unwrap().0
    }

    #[test]
    fn six_comparison_operators() {
        let cases: [(fn(Reg, Reg, i16) -> Instr, fn(Reg, i16) -> Instr, CmpOp); 6] = [
            (Instr::IfEq, Instr::IfEqz, CmpOp::Eq),
            (Instr::IfNe, Instr::IfNez, CmpOp::Ne),
            (Instr::IfLt, Instr::IfLtz, CmpOp::Lt),
            (Instr::IfGe, Instr::IfGez, CmpOp::Ge),
            (Instr::IfGt, Instr::IfGtz, CmpOp::Gt),
            (Instr::IfLe, Instr::IfLez, CmpOp::Le),
        ];
        for (two, zero, op) in cases {
            for instr in [two(r(0), r(1), 3), zero(r(0), 3)] {
                let body = body_of("(II)V", 2, &[instr, Instr::ReturnVoid, Instr::ReturnVoid]);
                let Stmt::If { cond, target } = &body.stmts[2] else {
                    panic!("expected an if statement");
                };
                assert_eq!(cond.op, op);
                assert_eq!(cond.lhs, Value::Local(LocalId(0)));
                assert!(matches!(
                    cond.rhs,
                    Value::Local(LocalId(1)) | Value::Const(Constant::Int(0))
                ));
                assert_eq!(*target, Target::Stmt(StmtId(4)));
            }
        }
    }

    #[test]
    fn backward_branch() {
        let body = body_of("()V", 1, &[Instr::Const4(r(0), 0), Instr::Goto(-1)]);
        assert_eq!(body.stmts[1], Stmt::Goto(Target::Stmt(StmtId(0))));
    }

    #[test]
    fn branch_before_entry() {
        let method = static_method("()V", 1, &[Instr::Goto(-1)]);
        assert!(matches!(
            decode(&method),
            Err(IrError::UnresolvedTarget { offset: -1, .. })
        ));
    }

    #[test]
    fn branch_past_last_instruction() {
        let method = static_method("()V", 1, &[Instr::Goto(10), Instr::ReturnVoid]);
        assert!(matches!(
            decode(&method),
            Err(IrError::UnresolvedTarget { branch: Addr(0), offset: 10 })
        ));
        // first address after the code
        let method = static_method("()V", 1, &[Instr::ReturnVoid, Instr::Goto(1)]);
        assert!(matches!(
            decode(&method),
            Err(IrError::UnresolvedTarget { branch: Addr(1), offset: 1 })
        ));
    }

    #[test]
    fn branch_inside_instruction() {
        let method = static_method("(I)V", 1, &[Instr::IfEqz(r(0), 1), Instr::ReturnVoid]);
        assert!(matches!(
            decode(&method),
            Err(IrError::UnresolvedTarget { branch: Addr(0), offset: 1 })
        ));
    }

    #[test]
    fn constraints_are_symmetric() {
        let method = static_method(
            "(II)V",
            2,
            &[Instr::IfEq(r(1), r(0), 3), Instr::ReturnVoid, Instr::ReturnVoid],
        );
        let (_, collector) = decode(&method).unwrap();
        let collector = collector.unwrap();
        let lhs = ValueBox::new(StmtId(2), 0);
        let rhs = ValueBox::new(StmtId(2), 1);
        assert_eq!(Constraint::new(lhs, rhs), Constraint::new(rhs, lhs));
        assert!(collector
            .iter_constraints()
            .any(|c| *c == Constraint::new(rhs, lhs)));
    }

    #[test]
    fn typing_disabled() {
        let method = static_method("(I)V", 1, &[Instr::ReturnVoid]);
        let (body, collector) =
            decode_method(&method, &pools(), LiftOptions::new().without_typing()).unwrap();
        assert!(collector.is_none());
        assert!(body.types.is_none());
    }

    #[test]
    fn invoke_arity() {
        // put(IJLjava/lang/String;)V takes four registers
        let method = static_method(
            "()V",
            5,
            &[
                Instr::InvokeStatic(RegList::from(vec![0u8, 1, 2]), Index::new(1)),
                Instr::ReturnVoid,
            ],
        );
        assert!(matches!(
            decode(&method),
            Err(IrError::ArityMismatch {
                expected: 4,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn wide_argument_in_split_registers() {
        let method = static_method(
            "()V",
            5,
            &[
                Instr::InvokeStatic(RegList::from(vec![0u8, 1, 3, 4]), Index::new(1)),
                Instr::ReturnVoid,
            ],
        );
        assert!(matches!(
            decode(&method),
            Err(IrError::BadFormat {
                mnemonic: "invoke-static",
                ..
            })
        ));
    }

    #[test]
    fn invoke_arguments() {
        let body = body_of(
            "()V",
            5,
            &[
                Instr::InvokeStatic(RegList::from(vec![0u8, 1, 2, 3]), Index::new(1)),
                Instr::ReturnVoid,
            ],
        );
        let Stmt::Invoke(invoke) = &body.stmts[0] else {
            panic!("expected an invocation");
        };
        let regs: Vec<String> = invoke
            .args
            .iter()
            .filter_map(Value::as_local)
            .map(|id| body.locals[id.0].to_string())
            .collect();
        assert_eq!(regs, vec!["v0", "v1", "v3"]);
    }

    #[test]
    fn move_result_without_invoke() {
        let method = static_method("()V", 1, &[Instr::Const4(r(0), 0), Instr::MoveResult(r(0))]);
        assert!(matches!(
            decode(&method),
            Err(IrError::BadFormat {
                addr: Addr(1),
                mnemonic: "move-result",
                ..
            })
        ));
    }

    #[test]
    fn move_result_claims_invoke() {
        let method = static_method(
            "()I",
            1,
            &[
                Instr::InvokeStatic(RegList::from(Vec::<u8>::new()), Index::new(0)),
                Instr::MoveResult(r(0)),
                Instr::Return(r(0)),
            ],
        );
        let body = lift_method(&method, &pools(), LiftOptions::default()).unwrap();
        assert_eq!(body.stmts.len(), 2);
        assert!(matches!(
            &body.stmts[0],
            Stmt::Assign {
                place: Place::Local(LocalId(0)),
                expr: Expr::Invoke(_),
            }
        ));
        assert_eq!(body.type_of(LocalId(0)), Some(&Type::Int));

        let wrong_width = static_method(
            "()V",
            2,
            &[
                Instr::InvokeStatic(RegList::from(Vec::<u8>::new()), Index::new(0)),
                Instr::MoveResultWide(r(0)),
                Instr::ReturnVoid,
            ],
        );
        assert!(matches!(decode(&wrong_width), Err(IrError::BadFormat { .. })));
    }

    #[test]
    fn registers_out_of_bounds() {
        let method = static_method("()V", 2, &[Instr::Const4(r(3), 0), Instr::ReturnVoid]);
        assert!(matches!(
            decode(&method),
            Err(IrError::RegisterOutOfBounds { registers_size: 2, .. })
        ));
        let method = static_method("()V", 2, &[Instr::ConstWide16(r(1), 0), Instr::ReturnVoid]);
        assert!(matches!(
            decode(&method),
            Err(IrError::RegisterOutOfBounds { .. })
        ));
    }

    #[test]
    fn entry_identities() {
        let method = method(
            "init",
            "(JI)V",
            AccessFlags::ACC_PUBLIC,
            5,
            &[Instr::ReturnVoid],
            Vec::new(),
        );
        let body = lift_method(&method, &pools(), LiftOptions::default()).unwrap();
        let sources: Vec<_> = body
            .stmts
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Identity { source, .. } => Some(source.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            sources,
            vec![
                IdentitySource::This(Type::class("a/C")),
                IdentitySource::Parameter(0, Type::Long),
                IdentitySource::Parameter(1, Type::Int),
            ]
        );
        let regs: Vec<String> = body.locals.iter().map(ToString::to_string).collect();
        assert_eq!(regs, vec!["v1", "v2", "v4"]);
        assert_eq!(body.type_of(LocalId(1)), Some(&Type::Long));
    }

    #[test]
    fn frame_too_small_for_parameters() {
        let mut method = static_method("(I)V", 2, &[Instr::ReturnVoid]);
        if let Some(code) = method.code.as_mut() {
            code.ins_size = 2;
        }
        assert!(matches!(
            decode(&method),
            Err(IrError::ArityMismatch {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn packed_switch() {
        let body = body_of(
            "(I)V",
            1,
            &[
                Instr::PackedSwitch(r(0), 4),
                Instr::ReturnVoid,
                Instr::PackedSwitchPayload {
                    first_key: 10,
                    targets: vec![3, 3],
                },
            ],
        );
        assert_eq!(
            body.stmts[1],
            Stmt::Switch {
                key: Value::Local(LocalId(0)),
                cases: vec![(10, Target::Stmt(StmtId(2))), (11, Target::Stmt(StmtId(2)))],
                default: Target::Stmt(StmtId(2)),
            }
        );
        assert_eq!(body.stmts.len(), 3);
    }

    #[test]
    fn switch_on_wrong_payload() {
        let method = static_method(
            "(I)V",
            1,
            &[
                Instr::SparseSwitch(r(0), 4),
                Instr::ReturnVoid,
                Instr::PackedSwitchPayload {
                    first_key: 0,
                    targets: vec![3],
                },
            ],
        );
        assert!(matches!(
            decode(&method),
            Err(IrError::BadFormat {
                mnemonic: "sparse-switch",
                ..
            })
        ));
    }

    #[test]
    fn fill_array_data() {
        let body = body_of(
            "()V",
            2,
            &[
                Instr::Const4(r(0), 2),
                Instr::NewArray(r(1), r(0), Index::new(1)),
                Instr::FillArrayData(r(1), 5),
                Instr::ReturnVoid,
                Instr::Nop,
                Instr::FillArrayDataPayload {
                    width: 4,
                    data: vec![1, 0, 0, 0, 0xfe, 0xff, 0xff, 0xff],
                },
            ],
        );
        assert_eq!(
            body.stmts[3],
            Stmt::Assign {
                place: Place::ArrayElement(
                    Value::Local(LocalId(1)),
                    Value::Const(Constant::Int(1))
                ),
                expr: Expr::Use(Value::Const(Constant::Int(-2))),
            }
        );
        assert_eq!(body.stmts.len(), 6);
    }

    #[test]
    fn field_width_mismatch() {
        let method = static_method(
            "(La/C;)V",
            3,
            &[Instr::IgetWide(r(0), r(2), Index::new(0)), Instr::ReturnVoid],
        );
        assert!(matches!(
            decode(&method),
            Err(IrError::BadFormat {
                mnemonic: "iget-wide",
                ..
            })
        ));
    }

    #[test]
    fn return_kind_checked() {
        let method = static_method("()I", 1, &[Instr::ReturnVoid]);
        assert!(matches!(decode(&method), Err(IrError::BadFormat { .. })));
        let method = static_method("()I", 1, &[Instr::Const4(r(0), 0), Instr::ReturnObject(r(0))]);
        assert!(matches!(decode(&method), Err(IrError::BadFormat { .. })));
    }

    #[test]
    fn caught_exception_type() {
        let tries = vec![TryItem {
            start: Addr(0),
            count: 3,
            handler: CatchHandler {
                catches: vec![(Index::new(3), Addr(4))],
                catch_all: None,
            },
        }];
        let method = method(
            "test",
            "()V",
            AccessFlags::ACC_STATIC,
            1,
            &[
                Instr::InvokeStatic(RegList::from(Vec::<u8>::new()), Index::new(0)),
                Instr::ReturnVoid,
                Instr::MoveException(r(0)),
                Instr::Throw(r(0)),
            ],
            tries,
        );
        let body = lift_method(&method, &pools(), LiftOptions::default()).unwrap();
        assert_eq!(
            body.stmts[2],
            Stmt::Identity {
                local: LocalId(0),
                source: IdentitySource::CaughtException(Type::class("java/io/IOException")),
            }
        );
        assert_eq!(body.traps.len(), 1);
        assert_eq!(body.traps[0].handler, StmtId(2));
        assert_eq!(
            body.type_of(LocalId(0)),
            Some(&Type::class("java/io/IOException"))
        );
    }

    #[test]
    fn handler_rejects_foreign_instruction() {
        let method = static_method("()V", 1, &[Instr::ReturnVoid]);
        let pools = pools();
        let code = method.code().unwrap();
        let mut cx = LiftContext::new(&method, code, &pools, LiftOptions::default());
        let nop = LabeledInstr::new(Addr(0), Instr::Nop);
        assert!(matches!(
            consts::ConstHandler.lift(&nop, &mut cx),
            Err(IrError::BadFormat { mnemonic: "nop", .. })
        ));
        assert!(handler_for(&Instr::Nop).lift(&nop, &mut cx).is_ok());
    }

    #[test]
    fn arithmetic_dispatch() {
        let method = static_method("()V", 4, &[Instr::ReturnVoid]);
        let pools = pools();
        let code = method.code().unwrap();
        let mut cx = LiftContext::new(&method, code, &pools, LiftOptions::default());
        let instrs = [
            Instr::NegInt(r(0), r(1)),
            Instr::IntToLong(r(2), r(0)),
            Instr::AddInt(r(0), r(1), r(0)),
            Instr::AddInt2addr(r(0), r(1)),
            Instr::RsubInt(r(0), r(1), 7),
            Instr::AddIntLit8(r(0), r(1), -1),
        ];
        for instr in instrs {
            let labeled = LabeledInstr::new(Addr(0), instr);
            assert!(handler_for(&labeled.instr).lift(&labeled, &mut cx).is_ok());
        }
        assert!(matches!(
            arith::ArithHandler.lift(&LabeledInstr::new(Addr(0), Instr::ReturnVoid), &mut cx),
            Err(IrError::BadFormat { mnemonic: "return-void", .. })
        ));
    }
}
