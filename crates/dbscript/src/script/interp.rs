use super::{
    ast::{BinaryOp, DeclKind, Expr, Literal, LogicalOp, Program, Stmt, UnaryOp},
    builtins,
    scope::Scope,
    value::Closure,
    Dynamic, Interrupter,
};
use crate::{host, OutputSink};
use dbscript_core::Error;

use indexmap::IndexMap;
use std::{cell::RefCell, cmp::Ordering, rc::Rc, sync::Arc};

/// Why evaluation left the normal statement sequence.
#[derive(Debug)]
pub(crate) enum Unwind {
    Break,
    Continue,
    Return(Dynamic),
    Throw(Dynamic),
    Error(Error),

    /// The cancel token was observed. Never caught by `try`.
    Interrupted,
}

impl From<Error> for Unwind {
    fn from(err: Error) -> Unwind {
        Unwind::Error(err)
    }
}

pub(crate) type Flow<T> = std::result::Result<T, Unwind>;

/// Most `undefined` slots a single array write may add before its index.
const MAX_ARRAY_GAP: usize = 1 << 16;

fn fail<T>(message: impl Into<String>) -> Flow<T> {
    Err(Unwind::Error(Error::evaluation(message)))
}

/// An assignable location.
enum Place {
    Var(String),
    Property(Dynamic, Key),
}

pub(crate) enum Key {
    Name(String),
    Index(i64),
}

impl Key {
    /// Canonical integer strings such as `"3"` index like the number 3.
    fn from_value(value: &Dynamic) -> Key {
        let index = match value {
            Dynamic::Str(s) => s.parse::<i64>().ok().filter(|index| index.to_string() == **s),
            other => other.as_i64(),
        };
        match index {
            Some(index) => Key::Index(index),
            None => Key::Name(value.to_string()),
        }
    }

    fn name(&self) -> String {
        match self {
            Key::Name(name) => name.clone(),
            Key::Index(index) => index.to_string(),
        }
    }
}

pub(crate) struct Interpreter {
    pub(crate) globals: Rc<Scope>,
    pub(crate) sink: Arc<dyn OutputSink>,
    interrupter: Interrupter,
    depth: usize,
    max_depth: usize,

    /// Expressions currently being evaluated inside the innermost call
    nesting: usize,
    max_nesting: usize,
}

impl Interpreter {
    pub(crate) fn new(
        sink: Arc<dyn OutputSink>,
        interrupter: Interrupter,
        max_depth: usize,
        max_nesting: usize,
    ) -> Self {
        Self {
            globals: Scope::global(),
            sink,
            interrupter,
            depth: 0,
            max_depth,
            nesting: 0,
            max_nesting,
        }
    }

    /// Runs a program, returning the value of the last expression statement.
    pub(crate) fn run(&mut self, program: &Program) -> Flow<Dynamic> {
        let scope = self.globals.clone();
        self.hoist(&program.body, &scope);

        let mut completion = Dynamic::Undefined;
        for stmt in &program.body {
            match self.exec(stmt, &scope) {
                Ok(Some(value)) => completion = value,
                Ok(None) => {}
                Err(Unwind::Return(value)) => return Ok(value),
                Err(Unwind::Break | Unwind::Continue) => {
                    return fail("`break` or `continue` outside of a loop")
                }
                Err(unwind) => return Err(unwind),
            }
        }
        Ok(completion)
    }

    fn hoist(&mut self, body: &[Stmt], scope: &Rc<Scope>) {
        for stmt in body {
            if let Stmt::Function(def) = stmt {
                if let Some(name) = &def.name {
                    let closure = Closure {
                        def: def.clone(),
                        scope: scope.clone(),
                    };
                    scope.declare(name, Dynamic::Function(Rc::new(closure)), false);
                }
            }
        }
    }

    fn exec_block(&mut self, body: &[Stmt], parent: &Rc<Scope>) -> Flow<Option<Dynamic>> {
        let scope = Scope::block(parent);
        self.hoist(body, &scope);

        let mut completion = None;
        for stmt in body {
            if let Some(value) = self.exec(stmt, &scope)? {
                completion = Some(value);
            }
        }
        Ok(completion)
    }

    /// Runs one loop iteration. Returns `false` when the loop should stop.
    fn iterate(&mut self, body: &Stmt, scope: &Rc<Scope>, completion: &mut Option<Dynamic>) -> Flow<bool> {
        self.interrupter.tick()?;
        match self.exec(body, scope) {
            Ok(value) => {
                if value.is_some() {
                    *completion = value;
                }
                Ok(true)
            }
            Err(Unwind::Break) => Ok(false),
            Err(Unwind::Continue) => Ok(true),
            Err(unwind) => Err(unwind),
        }
    }

    fn exec(&mut self, stmt: &Stmt, scope: &Rc<Scope>) -> Flow<Option<Dynamic>> {
        self.interrupter.tick()?;

        match stmt {
            Stmt::Expr(expr) => Ok(Some(self.eval(expr, scope)?)),
            Stmt::Decl(kind, bindings) => {
                for (name, init) in bindings {
                    let value = match init {
                        Some(init) => Some(self.eval(init, scope)?),
                        None => None,
                    };
                    match kind {
                        DeclKind::Var => scope.declare_var(name, value),
                        DeclKind::Let => scope.declare(name, value.unwrap_or_default(), false),
                        DeclKind::Const => scope.declare(name, value.unwrap_or_default(), true),
                    }
                }
                Ok(None)
            }
            Stmt::Function(_) | Stmt::Empty => Ok(None),
            Stmt::If(test, consequent, alternate) => {
                if self.eval(test, scope)?.is_truthy() {
                    self.exec(consequent, scope)
                } else if let Some(alternate) = alternate {
                    self.exec(alternate, scope)
                } else {
                    Ok(None)
                }
            }
            Stmt::While(test, body) => {
                let mut completion = None;
                while self.eval(test, scope)?.is_truthy() {
                    if !self.iterate(body, scope, &mut completion)? {
                        break;
                    }
                }
                Ok(completion)
            }
            Stmt::DoWhile(body, test) => {
                let mut completion = None;
                loop {
                    if !self.iterate(body, scope, &mut completion)? {
                        break;
                    }
                    if !self.eval(test, scope)?.is_truthy() {
                        break;
                    }
                }
                Ok(completion)
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                let scope = Scope::block(scope);
                if let Some(init) = init {
                    self.exec(init, &scope)?;
                }

                let mut completion = None;
                loop {
                    if let Some(test) = test {
                        if !self.eval(test, &scope)?.is_truthy() {
                            break;
                        }
                    }
                    if !self.iterate(body, &scope, &mut completion)? {
                        break;
                    }
                    if let Some(update) = update {
                        self.eval(update, &scope)?;
                    }
                }
                Ok(completion)
            }
            Stmt::ForIn {
                decl,
                name,
                object,
                body,
            } => {
                let object = self.eval(object, scope)?;
                let names = self.enumerate(&object)?;

                let mut completion = None;
                for key in names {
                    let iteration = Scope::block(scope);
                    match decl {
                        Some(DeclKind::Var) => iteration.declare_var(name, Some(key.into())),
                        Some(DeclKind::Let) => iteration.declare(name, key.into(), false),
                        Some(DeclKind::Const) => iteration.declare(name, key.into(), true),
                        None => iteration.assign(name, key.into())?,
                    }
                    if !self.iterate(body, &iteration, &mut completion)? {
                        break;
                    }
                }
                Ok(completion)
            }
            Stmt::Block(body) => self.exec_block(body, scope),
            Stmt::Break => Err(Unwind::Break),
            Stmt::Continue => Err(Unwind::Continue),
            Stmt::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(value, scope)?,
                    None => Dynamic::Undefined,
                };
                Err(Unwind::Return(value))
            }
            Stmt::Throw(value) => Err(Unwind::Throw(self.eval(value, scope)?)),
            Stmt::Try {
                block,
                param,
                handler,
                finalizer,
            } => {
                let result = match (self.exec_block(block, scope), handler) {
                    (Err(Unwind::Throw(value)), Some(handler)) => {
                        self.catch(handler, param.as_deref(), value, scope)
                    }
                    (Err(Unwind::Error(err)), Some(handler)) => {
                        self.catch(handler, param.as_deref(), Dynamic::from(err.to_string()), scope)
                    }
                    (result, _) => result,
                };

                if matches!(result, Err(Unwind::Interrupted)) {
                    return result;
                }
                if let Some(finalizer) = finalizer {
                    self.exec_block(finalizer, scope)?;
                }
                result
            }
        }
    }

    fn catch(
        &mut self,
        handler: &[Stmt],
        param: Option<&str>,
        caught: Dynamic,
        scope: &Rc<Scope>,
    ) -> Flow<Option<Dynamic>> {
        let scope = Scope::block(scope);
        if let Some(param) = param {
            scope.declare(param, caught, false);
        }
        self.exec_block(handler, &scope)
    }

    fn enumerate(&self, object: &Dynamic) -> Flow<Vec<String>> {
        Ok(match object {
            Dynamic::Object(entries) => entries.borrow().keys().cloned().collect(),
            Dynamic::Array(items) => host::index_names(items.borrow().len()),
            Dynamic::Str(s) => host::index_names(s.chars().count()),
            Dynamic::Host(object) => object.names()?,
            _ => vec![],
        })
    }

    /// Operator chains such as `a + b + c` parse without recursion, so their
    /// depth is only bounded here.
    pub(crate) fn eval(&mut self, expr: &Expr, scope: &Rc<Scope>) -> Flow<Dynamic> {
        if self.nesting >= self.max_nesting {
            return fail("nesting too deep");
        }
        self.nesting += 1;
        let result = self.eval_expr(expr, scope);
        self.nesting -= 1;
        result
    }

    fn eval_expr(&mut self, expr: &Expr, scope: &Rc<Scope>) -> Flow<Dynamic> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Undefined => Dynamic::Undefined,
                Literal::Null => Dynamic::Null,
                Literal::Bool(v) => Dynamic::Bool(*v),
                Literal::Int(v) => Dynamic::Int(*v),
                Literal::Float(v) => Dynamic::Float(*v),
                Literal::Str(s) => Dynamic::Str(s.clone()),
            }),
            Expr::Ident(name) => match scope.lookup(name) {
                Some(value) => Ok(value),
                None => fail(format!("`{name}` is not defined")),
            },
            Expr::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item, scope))
                    .collect::<Flow<Vec<_>>>()?;
                Ok(Dynamic::array(items))
            }
            Expr::Object(entries) => {
                let mut object = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    object.insert(key.clone(), self.eval(value, scope)?);
                }
                Ok(Dynamic::Object(Rc::new(RefCell::new(object))))
            }
            Expr::Function(def) => Ok(Dynamic::Function(Rc::new(Closure {
                def: def.clone(),
                scope: scope.clone(),
            }))),
            Expr::Unary(op, operand) => {
                let operand = self.eval(operand, scope)?;
                Ok(match op {
                    UnaryOp::Not => Dynamic::Bool(!operand.is_truthy()),
                    UnaryOp::Plus => operand.to_numeric(),
                    UnaryOp::Neg => match operand.to_numeric() {
                        Dynamic::Int(v) => v.checked_neg().map_or(Dynamic::Float(-(v as f64)), Dynamic::Int),
                        other => Dynamic::Float(-other.to_number()),
                    },
                })
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs, scope)?;
                let rhs = self.eval(rhs, scope)?;
                binary(*op, &lhs, &rhs)
            }
            Expr::Logical(op, lhs, rhs) => {
                let lhs = self.eval(lhs, scope)?;
                match (op, lhs.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(lhs),
                    _ => self.eval(rhs, scope),
                }
            }
            Expr::Assign(op, target, value) => {
                let place = self.place(target, scope)?;
                let value = match op {
                    Some(op) => {
                        let current = self.read(&place, scope)?;
                        let rhs = self.eval(value, scope)?;
                        binary(*op, &current, &rhs)?
                    }
                    None => self.eval(value, scope)?,
                };
                self.write(&place, value.clone(), scope)?;
                Ok(value)
            }
            Expr::Update {
                increment,
                prefix,
                target,
            } => {
                let place = self.place(target, scope)?;
                let old = self.read(&place, scope)?.to_numeric();
                let delta = Dynamic::Int(if *increment { 1 } else { -1 });
                let new = binary(BinaryOp::Add, &old, &delta)?;
                self.write(&place, new.clone(), scope)?;
                Ok(if *prefix { new } else { old })
            }
            Expr::Conditional(test, consequent, alternate) => {
                if self.eval(test, scope)?.is_truthy() {
                    self.eval(consequent, scope)
                } else {
                    self.eval(alternate, scope)
                }
            }
            Expr::Call(callee, args) => match &**callee {
                Expr::Member(object, name) => {
                    let receiver = self.eval(object, scope)?;
                    let args = self.eval_args(args, scope)?;
                    self.call_method(&receiver, name, args)
                }
                Expr::Index(object, index) => {
                    let receiver = self.eval(object, scope)?;
                    let name = self.eval(index, scope)?.to_string();
                    let args = self.eval_args(args, scope)?;
                    self.call_method(&receiver, &name, args)
                }
                callee => {
                    let function = self.eval(callee, scope)?;
                    let args = self.eval_args(args, scope)?;
                    self.call(&function, args)
                }
            },
            Expr::Member(object, name) => {
                let object = self.eval(object, scope)?;
                self.get_property(&object, &Key::Name(name.clone()))
            }
            Expr::Index(object, index) => {
                let object = self.eval(object, scope)?;
                let index = self.eval(index, scope)?;
                self.get_property(&object, &Key::from_value(&index))
            }
            Expr::Typeof(operand) => {
                if let Expr::Ident(name) = &**operand {
                    if scope.lookup(name).is_none() {
                        return Ok(Dynamic::from("undefined"));
                    }
                }
                Ok(Dynamic::from(self.eval(operand, scope)?.type_of()))
            }
            Expr::Delete(target) => {
                let Place::Property(object, key) = self.place(target, scope)? else {
                    return Ok(Dynamic::Bool(false));
                };
                self.delete_property(&object, &key).map(Dynamic::Bool)
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr], scope: &Rc<Scope>) -> Flow<Vec<Dynamic>> {
        args.iter().map(|arg| self.eval(arg, scope)).collect()
    }

    fn place(&mut self, target: &Expr, scope: &Rc<Scope>) -> Flow<Place> {
        match target {
            Expr::Ident(name) => Ok(Place::Var(name.clone())),
            Expr::Member(object, name) => {
                let object = self.eval(object, scope)?;
                Ok(Place::Property(object, Key::Name(name.clone())))
            }
            Expr::Index(object, index) => {
                let object = self.eval(object, scope)?;
                let index = self.eval(index, scope)?;
                Ok(Place::Property(object, Key::from_value(&index)))
            }
            _ => fail("invalid assignment target"),
        }
    }

    fn read(&mut self, place: &Place, scope: &Rc<Scope>) -> Flow<Dynamic> {
        match place {
            Place::Var(name) => match scope.lookup(name) {
                Some(value) => Ok(value),
                None => fail(format!("`{name}` is not defined")),
            },
            Place::Property(object, key) => self.get_property(object, key),
        }
    }

    fn write(&mut self, place: &Place, value: Dynamic, scope: &Rc<Scope>) -> Flow<()> {
        match place {
            Place::Var(name) => scope.assign(name, value),
            Place::Property(object, key) => self.set_property(object, key, value),
        }
    }

    pub(crate) fn get_property(&mut self, object: &Dynamic, key: &Key) -> Flow<Dynamic> {
        Ok(match (object, key) {
            (Dynamic::Undefined | Dynamic::Null, key) => {
                return fail(format!(
                    "cannot read property `{}` of {object}",
                    key.name()
                ))
            }
            (Dynamic::Host(host), Key::Name(name)) => {
                match host.methods().iter().find(|method| **method == name.as_str()) {
                    Some(method) => Dynamic::Method(host.clone(), *method),
                    None => host.get(name)?.unwrap_or_default(),
                }
            }
            (Dynamic::Host(host), Key::Index(index)) => host.get_index(*index)?.unwrap_or_default(),
            (Dynamic::Array(items), Key::Name(name)) if name == "length" => {
                Dynamic::from(items.borrow().len())
            }
            (Dynamic::Array(items), Key::Index(index)) => usize::try_from(*index)
                .ok()
                .and_then(|index| items.borrow().get(index).cloned())
                .unwrap_or_default(),
            (Dynamic::Object(entries), key) => {
                entries.borrow().get(&key.name()).cloned().unwrap_or_default()
            }
            (Dynamic::Str(s), Key::Name(name)) if name == "length" => Dynamic::from(s.chars().count()),
            (Dynamic::Str(s), Key::Index(index)) => usize::try_from(*index)
                .ok()
                .and_then(|index| s.chars().nth(index))
                .map(|c| Dynamic::from(c.to_string()))
                .unwrap_or_default(),
            (Dynamic::Bytes(bytes), Key::Name(name)) if name == "length" => Dynamic::from(bytes.len()),
            (Dynamic::Bytes(bytes), Key::Index(index)) => usize::try_from(*index)
                .ok()
                .and_then(|index| bytes.get(index))
                .map(|byte| Dynamic::Int(i64::from(*byte)))
                .unwrap_or_default(),
            _ => Dynamic::Undefined,
        })
    }

    fn set_property(&mut self, object: &Dynamic, key: &Key, value: Dynamic) -> Flow<()> {
        match (object, key) {
            (Dynamic::Host(host), Key::Name(name)) => Ok(host.put(name, value)?),
            (Dynamic::Host(host), Key::Index(index)) => Ok(host.put_index(*index, value)?),
            (Dynamic::Object(entries), key) => {
                entries.borrow_mut().insert(key.name(), value);
                Ok(())
            }
            (Dynamic::Array(items), Key::Index(index)) => {
                let Ok(index) = usize::try_from(*index) else {
                    return fail(format!("invalid array index {index}"));
                };
                let mut items = items.borrow_mut();
                if index >= items.len() {
                    if index - items.len() > MAX_ARRAY_GAP {
                        return fail(format!(
                            "array index {index} is too far past the end of an array of length {}",
                            items.len()
                        ));
                    }
                    items.resize(index + 1, Dynamic::Undefined);
                }
                items[index] = value;
                Ok(())
            }
            (object, key) => fail(format!(
                "cannot set property `{}` of {}",
                key.name(),
                object.describe()
            )),
        }
    }

    fn delete_property(&mut self, object: &Dynamic, key: &Key) -> Flow<bool> {
        match (object, key) {
            (Dynamic::Host(host), key) => Ok(host.delete(&key.name())?),
            (Dynamic::Object(entries), key) => Ok(entries.borrow_mut().shift_remove(&key.name()).is_some()),
            (Dynamic::Array(items), Key::Index(index)) => {
                let mut items = items.borrow_mut();
                if let Some(slot) = usize::try_from(*index).ok().and_then(|index| items.get_mut(index)) {
                    *slot = Dynamic::Undefined;
                }
                Ok(true)
            }
            _ => Ok(true),
        }
    }

    fn call_method(&mut self, receiver: &Dynamic, name: &str, args: Vec<Dynamic>) -> Flow<Dynamic> {
        match receiver {
            Dynamic::Host(host) if host::has_method(&**host, name) => {
                self.interrupter.tick()?;
                return Ok(host.invoke(name, &args)?);
            }
            Dynamic::Array(items) => {
                if let Some(value) = builtins::array_method(self, items, name, &args)? {
                    return Ok(value);
                }
            }
            Dynamic::Str(s) => {
                if let Some(value) = builtins::string_method(s, name, &args)? {
                    return Ok(value);
                }
            }
            _ => {}
        }

        let function = self.get_property(receiver, &Key::Name(name.to_string()))?;
        if !function.is_callable() {
            return fail(format!("{}.{name} is not a function", receiver.describe()));
        }
        self.call(&function, args)
    }

    pub(crate) fn call(&mut self, function: &Dynamic, args: Vec<Dynamic>) -> Flow<Dynamic> {
        self.interrupter.tick()?;

        match function {
            Dynamic::Function(closure) => self.call_closure(closure, args),
            Dynamic::Native(native) => (native.func)(self, &args),
            Dynamic::Method(host, method) => Ok(host.invoke(method, &args)?),
            other => fail(format!("{} is not a function", other.describe())),
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Dynamic>) -> Flow<Dynamic> {
        if self.depth >= self.max_depth {
            return fail(format!("maximum call depth of {} exceeded", self.max_depth));
        }

        let def = &closure.def;
        let scope = Scope::function(&closure.scope);
        if let Some(name) = &def.name {
            scope.declare(
                name,
                Dynamic::Function(Rc::new(Closure {
                    def: def.clone(),
                    scope: closure.scope.clone(),
                })),
                false,
            );
        }
        let mut args = args.into_iter();
        for param in &def.params {
            scope.declare(param, args.next().unwrap_or_default(), false);
        }
        self.hoist(&def.body, &scope);

        self.depth += 1;
        let nesting = std::mem::take(&mut self.nesting);
        let result = def
            .body
            .iter()
            .try_for_each(|stmt| self.exec(stmt, &scope).map(drop));
        self.nesting = nesting;
        self.depth -= 1;

        match result {
            Ok(()) => Ok(Dynamic::Undefined),
            Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Break | Unwind::Continue) => fail("`break` or `continue` outside of a loop"),
            Err(unwind) => Err(unwind),
        }
    }
}

/// Applies a binary operator with JavaScript's coercions.
pub(crate) fn binary(op: BinaryOp, lhs: &Dynamic, rhs: &Dynamic) -> Flow<Dynamic> {
    use Dynamic::{Bool, Int, Str};

    Ok(match op {
        BinaryOp::Add => {
            if is_stringy(lhs) || is_stringy(rhs) {
                Dynamic::from(format!("{lhs}{rhs}"))
            } else {
                arith(lhs, rhs, i64::checked_add, |a, b| a + b)
            }
        }
        BinaryOp::Sub => arith(lhs, rhs, i64::checked_sub, |a, b| a - b),
        BinaryOp::Mul => arith(lhs, rhs, i64::checked_mul, |a, b| a * b),
        BinaryOp::Div => arith(
            lhs,
            rhs,
            |a, b| {
                if b != 0 && a.checked_rem(b) == Some(0) {
                    a.checked_div(b)
                } else {
                    None
                }
            },
            |a, b| a / b,
        ),
        BinaryOp::Rem => arith(lhs, rhs, |a, b| a.checked_rem(b), |a, b| a % b),
        BinaryOp::Eq => Bool(lhs.loose_eq(rhs)),
        BinaryOp::Ne => Bool(!lhs.loose_eq(rhs)),
        BinaryOp::StrictEq => Bool(lhs.strict_eq(rhs)),
        BinaryOp::StrictNe => Bool(!lhs.strict_eq(rhs)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (lhs, rhs) {
                (Str(a), Str(b)) => Some(a.cmp(b)),
                (Int(a), Int(b)) => Some(a.cmp(b)),
                _ => lhs.to_number().partial_cmp(&rhs.to_number()),
            };
            Bool(match (op, ordering) {
                (_, None) => false,
                (BinaryOp::Lt, Some(ord)) => ord == Ordering::Less,
                (BinaryOp::Le, Some(ord)) => ord != Ordering::Greater,
                (BinaryOp::Gt, Some(ord)) => ord == Ordering::Greater,
                (_, Some(ord)) => ord != Ordering::Less,
            })
        }
        BinaryOp::In => Bool(match rhs {
            Dynamic::Object(entries) => entries.borrow().contains_key(&lhs.to_string()),
            Dynamic::Array(items) => match lhs.as_i64() {
                Some(index) => usize::try_from(index).is_ok_and(|index| index < items.borrow().len()),
                None => lhs.as_str() == Some("length"),
            },
            Dynamic::Host(host) => match (lhs, lhs.as_i64()) {
                (Str(name), _) => host.has(name),
                (_, Some(index)) => host.has_index(index),
                _ => false,
            },
            other => {
                return fail(format!("cannot use `in` to search a {}", other.describe()));
            }
        }),
    })
}

fn is_stringy(value: &Dynamic) -> bool {
    matches!(
        value,
        Dynamic::Str(_) | Dynamic::Array(_) | Dynamic::Object(_) | Dynamic::Host(_) | Dynamic::Bytes(_)
    )
}

fn arith(
    lhs: &Dynamic,
    rhs: &Dynamic,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Dynamic {
    match (lhs.to_numeric(), rhs.to_numeric()) {
        (Dynamic::Int(a), Dynamic::Int(b)) => int_op(a, b)
            .map(Dynamic::Int)
            .unwrap_or_else(|| Dynamic::Float(float_op(a as f64, b as f64))),
        (a, b) => Dynamic::Float(float_op(a.to_number(), b.to_number())),
    }
}
