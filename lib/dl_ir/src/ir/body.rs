use crate::ir::expr::{Callee, Expr, InvokeExpr, Place};
use crate::ir::stmt::{Slot, Stmt, StmtId, Target};
use crate::ir::value::{Local, LocalId, Value};
use crate::typing::TypeAssignment;
use dl_bytecode::pools::MethodRef;
use dl_bytecode::types::Type;
use dl_bytecode::Addr;
use std::fmt;

/// An exception range: statements in `start..end` are protected by the
/// handler starting at `handler`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trap {
    pub start: StmtId,
    pub end: StmtId,
    pub handler: StmtId,
    /// Caught exception class, `None` for catch-all clauses.
    pub exception: Option<Type>,
}

impl Trap {
    #[must_use]
    pub fn covers(&self, id: StmtId) -> bool {
        self.start <= id && id < self.end
    }
}

/// A lifted method body.
#[derive(Debug, Clone)]
pub struct Body {
    pub method: MethodRef,
    pub locals: Vec<Local>,
    pub stmts: Vec<Stmt>,
    /// Source address of each statement.
    pub addrs: Vec<Addr>,
    /// Statements lifted from an instruction that may throw.
    pub throwing: Vec<bool>,
    pub traps: Vec<Trap>,
    pub types: Option<TypeAssignment>,
}

impl Body {
    #[inline]
    pub fn iter_stmts(&self) -> impl Iterator<Item = (StmtId, &Stmt)> {
        self.stmts.iter().enumerate().map(|(i, s)| (StmtId(i), s))
    }

    #[must_use]
    pub fn stmt(&self, id: StmtId) -> Option<&Stmt> {
        self.stmts.get(id.0)
    }

    #[must_use]
    pub fn addr(&self, id: StmtId) -> Option<Addr> {
        self.addrs.get(id.0).copied()
    }

    #[must_use]
    pub fn can_throw(&self, id: StmtId) -> bool {
        self.throwing.get(id.0).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn local(&self, id: LocalId) -> Option<&Local> {
        self.locals.get(id.0)
    }

    /// Solved type of a local, when typing was performed.
    #[must_use]
    pub fn type_of(&self, id: LocalId) -> Option<&Type> {
        self.types.as_ref().and_then(|types| types.get(id))
    }

    /// Drops the statements not flagged in `keep`, and the locals only they
    /// referred to. Kept branches must only target kept statements.
    ///
    /// Returns the new id of each original statement.
    pub fn retain_stmts(&mut self, keep: &[bool]) -> Vec<Option<StmtId>> {
        let mut remap = Vec::with_capacity(self.stmts.len());
        let mut kept = 0;
        for i in 0..self.stmts.len() {
            if keep.get(i).copied().unwrap_or(false) {
                remap.push(Some(StmtId(kept)));
                kept += 1;
            } else {
                remap.push(None);
            }
        }

        let mut stmts = Vec::with_capacity(kept);
        let mut addrs = Vec::with_capacity(kept);
        let mut throwing = Vec::with_capacity(kept);
        for (i, mut stmt) in std::mem::take(&mut self.stmts).into_iter().enumerate() {
            if remap[i].is_none() {
                continue;
            }
            for target in stmt.targets_mut() {
                if let Target::Stmt(id) = target {
                    if let Some(Some(new)) = remap.get(id.0) {
                        *id = *new;
                    }
                }
            }
            stmts.push(stmt);
            addrs.push(self.addr(StmtId(i)).unwrap_or_default());
            throwing.push(self.can_throw(StmtId(i)));
        }
        self.stmts = stmts;
        self.addrs = addrs;
        self.throwing = throwing;

        // ranges shrink to the kept statements they hold
        let first_kept = |from: StmtId| {
            remap
                .iter()
                .skip(from.0)
                .flatten()
                .next()
                .copied()
                .unwrap_or(StmtId(kept))
        };
        self.traps = std::mem::take(&mut self.traps)
            .into_iter()
            .filter_map(|trap| {
                let handler = remap.get(trap.handler.0).copied().flatten()?;
                let (start, end) = (first_kept(trap.start), first_kept(trap.end));
                (start < end).then_some(Trap {
                    start,
                    end,
                    handler,
                    exception: trap.exception,
                })
            })
            .collect();

        self.retain_used_locals();
        remap
    }

    fn retain_used_locals(&mut self) {
        let mut used = vec![false; self.locals.len()];
        for stmt in &self.stmts {
            for operand in stmt.boxes() {
                let local = match operand {
                    Slot::Use(value) => value.as_local(),
                    Slot::Def(local) => Some(*local),
                };
                if let Some(flag) = local.and_then(|local| used.get_mut(local.0)) {
                    *flag = true;
                }
            }
        }

        let mut renamed = Vec::with_capacity(self.locals.len());
        let mut locals = Vec::new();
        for (local, used) in std::mem::take(&mut self.locals).into_iter().zip(used) {
            if used {
                renamed.push(Some(LocalId(locals.len())));
                locals.push(local);
            } else {
                renamed.push(None);
            }
        }
        self.locals = locals;

        for stmt in &mut self.stmts {
            for operand in stmt.boxes_mut() {
                match operand {
                    Slot::Use(Value::Local(id)) | Slot::Def(id) => {
                        if let Some(Some(new)) = renamed.get(id.0) {
                            *id = *new;
                        }
                    }
                    Slot::Use(Value::Const(_)) => (),
                }
            }
        }
    }

    /// Renders a single statement the way the body listing does.
    #[must_use]
    pub fn display_stmt(&self, id: StmtId) -> String {
        self.stmt(id)
            .map(|stmt| StmtDisplay(self, stmt).to_string())
            .unwrap_or_default()
    }

    fn local_name(&self, id: LocalId) -> String {
        self.local(id).map_or_else(|| id.to_string(), Local::to_string)
    }

    fn fmt_value(&self, f: &mut fmt::Formatter, value: &Value) -> fmt::Result {
        match value {
            Value::Local(id) => write!(f, "{}", self.local_name(*id)),
            Value::Const(c) => write!(f, "{c}"),
        }
    }

    fn fmt_values(&self, f: &mut fmt::Formatter, values: &[Value]) -> fmt::Result {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            self.fmt_value(f, value)?;
        }
        Ok(())
    }

    fn fmt_invoke(&self, f: &mut fmt::Formatter, invoke: &InvokeExpr) -> fmt::Result {
        write!(f, "{} ", invoke.kind)?;
        let args = if invoke.kind.has_receiver() {
            if let Some((receiver, args)) = invoke.args.split_first() {
                self.fmt_value(f, receiver)?;
                write!(f, ".")?;
                args
            } else {
                &invoke.args[..]
            }
        } else {
            &invoke.args[..]
        };
        match &invoke.callee {
            Callee::Method(m) => write!(f, "{}(", m.name)?,
            Callee::CallSite(c) => write!(f, "{}(", c.name)?,
        }
        self.fmt_values(f, args)?;
        write!(f, ") {}", invoke.callee)
    }

    fn fmt_expr(&self, f: &mut fmt::Formatter, expr: &Expr) -> fmt::Result {
        match expr {
            Expr::Use(v) => self.fmt_value(f, v),
            Expr::Binary(op, a, b) => {
                self.fmt_value(f, a)?;
                write!(f, " {op} ")?;
                self.fmt_value(f, b)
            }
            Expr::Cmp(kind, a, b) => {
                self.fmt_value(f, a)?;
                write!(f, " {kind} ")?;
                self.fmt_value(f, b)
            }
            Expr::Unary(op, v) => {
                write!(f, "{op} ")?;
                self.fmt_value(f, v)
            }
            Expr::Cast(t, v) => {
                write!(f, "({}) ", t.to_java_string())?;
                self.fmt_value(f, v)
            }
            Expr::InstanceOf(t, v) => {
                self.fmt_value(f, v)?;
                write!(f, " instanceof {}", t.to_java_string())
            }
            Expr::Length(v) => {
                write!(f, "lengthof ")?;
                self.fmt_value(f, v)
            }
            Expr::New(t) => write!(f, "new {}", t.to_java_string()),
            Expr::NewArray(t, v) => {
                let elt = t.element_type().unwrap_or(Type::Void);
                write!(f, "newarray ({})[", elt.to_java_string())?;
                self.fmt_value(f, v)?;
                write!(f, "]")
            }
            Expr::FilledArray(t, values) => {
                write!(f, "newarray ({}) {{", t.to_java_string())?;
                self.fmt_values(f, values)?;
                write!(f, "}}")
            }
            Expr::ArrayRef(a, i) => {
                self.fmt_value(f, a)?;
                write!(f, "[")?;
                self.fmt_value(f, i)?;
                write!(f, "]")
            }
            Expr::InstanceField(o, field) => {
                self.fmt_value(f, o)?;
                write!(f, ".<{field}>")
            }
            Expr::StaticField(field) => write!(f, "<{field}>"),
            Expr::Invoke(invoke) => self.fmt_invoke(f, invoke),
        }
    }

    fn fmt_place(&self, f: &mut fmt::Formatter, place: &Place) -> fmt::Result {
        match place {
            Place::Local(id) => write!(f, "{}", self.local_name(*id)),
            Place::ArrayElement(a, i) => {
                self.fmt_value(f, a)?;
                write!(f, "[")?;
                self.fmt_value(f, i)?;
                write!(f, "]")
            }
            Place::InstanceField(o, field) => {
                self.fmt_value(f, o)?;
                write!(f, ".<{field}>")
            }
            Place::StaticField(field) => write!(f, "<{field}>"),
        }
    }

    fn fmt_stmt(&self, f: &mut fmt::Formatter, stmt: &Stmt) -> fmt::Result {
        match stmt {
            Stmt::Identity { local, source } => {
                write!(f, "{} := {source}", self.local_name(*local))
            }
            Stmt::Assign { place, expr } => {
                self.fmt_place(f, place)?;
                write!(f, " = ")?;
                self.fmt_expr(f, expr)
            }
            Stmt::Invoke(invoke) => self.fmt_invoke(f, invoke),
            Stmt::Eval(expr) => self.fmt_expr(f, expr),
            Stmt::If { cond, target } => {
                write!(f, "if ")?;
                self.fmt_value(f, &cond.lhs)?;
                write!(f, " {} ", cond.op)?;
                self.fmt_value(f, &cond.rhs)?;
                write!(f, " goto {target}")
            }
            Stmt::Goto(target) => write!(f, "goto {target}"),
            Stmt::Switch {
                key,
                cases,
                default,
            } => {
                write!(f, "switch ")?;
                self.fmt_value(f, key)?;
                write!(f, " {{")?;
                for (value, target) in cases {
                    write!(f, " case {value}: goto {target};")?;
                }
                write!(f, " default: goto {default}; }}")
            }
            Stmt::Return(v) => {
                write!(f, "return ")?;
                self.fmt_value(f, v)
            }
            Stmt::ReturnVoid => write!(f, "return"),
            Stmt::Throw(v) => {
                write!(f, "throw ")?;
                self.fmt_value(f, v)
            }
            Stmt::EnterMonitor(v) => {
                write!(f, "entermonitor ")?;
                self.fmt_value(f, v)
            }
            Stmt::ExitMonitor(v) => {
                write!(f, "exitmonitor ")?;
                self.fmt_value(f, v)
            }
            Stmt::Nop => write!(f, "nop"),
        }
    }
}

struct StmtDisplay<'a>(&'a Body, &'a Stmt);

impl<'a> fmt::Display for StmtDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt_stmt(f, self.1)
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "method {} {{", self.method)?;
        for (i, local) in self.locals.iter().enumerate() {
            match self.type_of(LocalId(i)) {
                Some(t) => writeln!(f, "    {} {local};", t.to_java_string())?,
                None => writeln!(f, "    unknown {local};")?,
            }
        }
        if !self.locals.is_empty() {
            writeln!(f)?;
        }
        for (id, stmt) in self.iter_stmts() {
            let addr = self
                .addr(id)
                .map_or_else(|| "    ".to_string(), |a| a.to_string());
            write!(f, "  {addr} {:>5}  ", id.to_string())?;
            self.fmt_stmt(f, stmt)?;
            writeln!(f, ";")?;
        }
        for trap in &self.traps {
            let exception = trap
                .exception
                .as_ref()
                .map_or_else(|| "*".to_string(), Type::to_java_string);
            writeln!(
                f,
                "    catch {exception} from {} to {} with {}",
                trap.start,
                trap.end,
                Target::Stmt(trap.handler)
            )?;
        }
        write!(f, "}}")
    }
}
