//! Method invocations.

use super::{use_hint, Handler, LiftContext};
use crate::errors::{IrError, IrResult};
use crate::ir::{Callee, InvokeExpr, InvokeKind, Stmt, Value, ValueBox};
use crate::typing::types::JAVA_LANG_INVOKE_METHOD_HANDLE;
use dl_bytecode::instrs::{Instr, LabeledInstr};
use dl_bytecode::pools::{Index, MethodId, ProtoRef};
use dl_bytecode::registers::Reg;
use dl_bytecode::types::Type;

pub struct InvokeHandler;

impl Handler for InvokeHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let (kind, regs, idx): (_, Vec<Reg>, _) = match instr.instr() {
            Instr::InvokeVirtual(args, m) => (InvokeKind::Virtual, args.iter().collect(), *m),
            Instr::InvokeSuper(args, m) => (InvokeKind::Super, args.iter().collect(), *m),
            Instr::InvokeDirect(args, m) => (InvokeKind::Direct, args.iter().collect(), *m),
            Instr::InvokeStatic(args, m) => (InvokeKind::Static, args.iter().collect(), *m),
            Instr::InvokeInterface(args, m) => (InvokeKind::Interface, args.iter().collect(), *m),
            Instr::InvokeVirtualRange(args, m) => (InvokeKind::Virtual, args.iter().collect(), *m),
            Instr::InvokeSuperRange(args, m) => (InvokeKind::Super, args.iter().collect(), *m),
            Instr::InvokeDirectRange(args, m) => (InvokeKind::Direct, args.iter().collect(), *m),
            Instr::InvokeStaticRange(args, m) => (InvokeKind::Static, args.iter().collect(), *m),
            Instr::InvokeInterfaceRange(args, m) => {
                (InvokeKind::Interface, args.iter().collect(), *m)
            }
            Instr::InvokePolymorphic(args, m, p) => {
                let proto = cx.symbols().proto(*p)?.clone();
                return polymorphic(instr, cx, args.iter().collect(), *m, proto);
            }
            Instr::InvokePolymorphicRange(args, m, p) => {
                let proto = cx.symbols().proto(*p)?.clone();
                return polymorphic(instr, cx, args.iter().collect(), *m, proto);
            }
            Instr::InvokeCustom(args, c) => {
                let call_site = cx.symbols().call_site(*c)?.clone();
                let proto = call_site.proto.clone();
                let callee = Callee::CallSite(call_site);
                let regs: Vec<Reg> = args.iter().collect();
                return invoke(instr, cx, InvokeKind::Custom, callee, proto, None, &regs);
            }
            Instr::InvokeCustomRange(args, c) => {
                let call_site = cx.symbols().call_site(*c)?.clone();
                let proto = call_site.proto.clone();
                let callee = Callee::CallSite(call_site);
                let regs: Vec<Reg> = args.iter().collect();
                return invoke(instr, cx, InvokeKind::Custom, callee, proto, None, &regs);
            }
            _ => return Err(cx.bad_format(instr, "not an invocation")),
        };

        let symbols = cx.symbols();
        let method = symbols.method(idx)?.clone();
        symbols.check_method(&method)?;
        let proto = method.proto.clone();
        let receiver = kind.has_receiver().then(|| method.class.clone());
        invoke(instr, cx, kind, Callee::Method(method), proto, receiver, &regs)
    }
}

/// Polymorphic invocations type their arguments after the call site
/// prototype; the receiver is the method handle.
fn polymorphic(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    regs: Vec<Reg>,
    idx: Index<MethodId>,
    proto: ProtoRef,
) -> IrResult<()> {
    let method = cx.symbols().method(idx)?.clone();
    let receiver = Some(JAVA_LANG_INVOKE_METHOD_HANDLE.clone());
    invoke(
        instr,
        cx,
        InvokeKind::Polymorphic,
        Callee::Method(method),
        proto,
        receiver,
        &regs,
    )
}

#[allow(clippy::too_many_arguments)]
fn invoke(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    kind: InvokeKind,
    callee: Callee,
    proto: ProtoRef,
    receiver: Option<Type>,
    regs: &[Reg],
) -> IrResult<()> {
    let expected = proto.params_slots() + usize::from(receiver.is_some());
    if regs.len() != expected {
        return Err(IrError::ArityMismatch {
            addr: instr.addr,
            expected,
            found: regs.len(),
        });
    }

    let mut args = Vec::with_capacity(proto.params.len() + 1);
    let mut hints = Vec::with_capacity(args.capacity());
    let mut regs = regs.iter().copied();
    if let Some(class) = &receiver {
        if let Some(reg) = regs.next() {
            args.push(Value::Local(cx.local(reg)?));
            hints.push(use_hint(class));
        }
    }
    for param in &proto.params {
        let Some(low) = regs.next() else { break };
        let local = if param.is_wide() {
            let high = regs.next();
            if high != low.next() {
                return Err(cx.bad_format(
                    instr,
                    format!("{param} argument in non consecutive registers"),
                ));
            }
            cx.wide(low)?
        } else {
            cx.local(low)?
        };
        args.push(Value::Local(local));
        hints.push(use_hint(param));
    }

    let ret = proto.ret.clone();
    let id = cx.push(
        instr,
        Stmt::Invoke(InvokeExpr {
            kind,
            callee,
            proto,
            args,
        }),
    );
    for (slot, hint) in hints.into_iter().enumerate() {
        cx.seed(ValueBox::new(id, slot), hint);
    }
    if ret != Type::Void {
        cx.set_result(id, ret);
    }
    Ok(())
}
