//! Tree-walking evaluator over the lowered [`ast`](super::ast).

use super::ast::*;
use super::error::ScriptError;
use super::host::HostGlobals;
use super::value::{join_array, number_to_string, Closure, Function, Object, Value};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// Nested closure calls allowed before a `RangeError`.
pub const MAX_CALL_DEPTH: usize = 128;

/// Native stack a single run may use before calls fail with a `RangeError`.
/// Half of the 2 MiB default for spawned threads, so unoptimized builds hit
/// this before they overflow.
pub const MAX_STACK_BYTES: usize = 1 << 20;

const MAX_ARRAY_LENGTH: usize = 1 << 24;

#[derive(Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

/// Lexical environment. `function_scope` marks where `var` lands.
pub struct Env {
    vars: RefCell<FxHashMap<String, Binding>>,
    parent: Option<Rc<Env>>,
    function_scope: bool,
}

impl Env {
    pub fn root() -> Rc<Env> {
        Rc::new(Env {
            vars: RefCell::default(),
            parent: None,
            function_scope: true,
        })
    }

    pub fn child(parent: &Rc<Env>, function_scope: bool) -> Rc<Env> {
        Rc::new(Env {
            vars: RefCell::default(),
            parent: Some(Rc::clone(parent)),
            function_scope,
        })
    }

    pub fn declare(&self, name: &str, value: Value, mutable: bool) {
        self.vars
            .borrow_mut()
            .insert(name.to_string(), Binding { value, mutable });
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.vars.borrow().get(name) {
            return Some(binding.value.clone());
        }
        self.parent.as_ref()?.lookup(name)
    }

    fn has_own(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
    }

    /// `None` when no scope declares `name`.
    fn assign(&self, name: &str, value: Value) -> Option<Result<(), ScriptError>> {
        if let Some(binding) = self.vars.borrow_mut().get_mut(name) {
            if !binding.mutable {
                return Some(Err(ScriptError::type_error(
                    "Assignment to constant variable.",
                )));
            }
            binding.value = value;
            return Some(Ok(()));
        }
        self.parent.as_ref()?.assign(name, value)
    }

    fn function_env(self: &Rc<Self>) -> Rc<Env> {
        match &self.parent {
            Some(parent) if !self.function_scope => parent.function_env(),
            _ => Rc::clone(self),
        }
    }

    /// Fresh copy of this scope's bindings, for per-iteration `let`.
    fn snapshot(&self) -> Rc<Env> {
        Rc::new(Env {
            vars: RefCell::new(self.vars.borrow().clone()),
            parent: self.parent.clone(),
            function_scope: self.function_scope,
        })
    }
}

/// Non-local exits that unwind through expressions.
pub(crate) enum Abrupt {
    Error(ScriptError),
    Throw { value: Value, line: u32 },
}

impl From<ScriptError> for Abrupt {
    fn from(e: ScriptError) -> Self {
        Abrupt::Error(e)
    }
}

impl Abrupt {
    fn at_line(self, line: u32) -> Self {
        match self {
            Abrupt::Error(e) => Abrupt::Error(e.at_line(line)),
            other => other,
        }
    }

    pub(crate) fn into_error(self) -> ScriptError {
        match self {
            Abrupt::Error(e) => e,
            Abrupt::Throw { value, line } => {
                ScriptError::uncaught(describe_thrown(&value)).at_line(line)
            }
        }
    }

    /// The value a `catch` clause binds.
    fn into_value(self) -> Value {
        match self {
            Abrupt::Throw { value, .. } => value,
            Abrupt::Error(e) => Value::object(vec![
                ("name".to_string(), Value::string(e.kind.name())),
                ("message".to_string(), Value::string(e.message)),
            ]),
        }
    }
}

/// Address of a local in a fresh frame. The distance between two readings
/// is the native stack used in between.
#[inline(never)]
fn stack_position() -> usize {
    let marker = 0u8;
    std::hint::black_box(&marker) as *const u8 as usize
}

fn describe_thrown(value: &Value) -> String {
    if let Value::Object(object) = value {
        let object = object.borrow();
        if let (Some(name), Some(message)) = (object.get("name"), object.get("message")) {
            return format!("{}: {}", name, message);
        }
    }
    value.to_display_string()
}

type Eval<T> = Result<T, Abrupt>;

/// Values a `for … of` or `for … in` loop walks. Arrays are read by index
/// against their current length, so pushes inside the body are visited.
enum LoopItems {
    Live(Rc<RefCell<Vec<Value>>>),
    Fixed(Vec<Value>),
}

impl LoopItems {
    fn get(&self, index: usize) -> Option<Value> {
        match self {
            LoopItems::Live(items) => items.borrow().get(index).cloned(),
            LoopItems::Fixed(items) => items.get(index).cloned(),
        }
    }
}

enum Flow {
    Normal(Option<Value>),
    Return(Value),
    Break,
    Continue,
}

enum LoopControl {
    Next,
    Exit,
    Propagate(Flow),
}

fn loop_control(flow: Flow, last: &mut Option<Value>) -> LoopControl {
    match flow {
        Flow::Normal(value) => {
            if value.is_some() {
                *last = value;
            }
            LoopControl::Next
        }
        Flow::Continue => LoopControl::Next,
        Flow::Break => LoopControl::Exit,
        ret @ Flow::Return(_) => LoopControl::Propagate(ret),
    }
}

enum Place {
    Var(String),
    Prop(Value, Value),
}

pub(crate) struct Interpreter<'h> {
    host: &'h HostGlobals,
    depth: usize,
    stack_base: usize,
}

impl<'h> Interpreter<'h> {
    pub(crate) fn new(host: &'h HostGlobals) -> Self {
        Self {
            host,
            depth: 0,
            stack_base: stack_position(),
        }
    }

    fn stack_exhausted(&self) -> bool {
        self.depth >= MAX_CALL_DEPTH
            || self.stack_base.abs_diff(stack_position()) > MAX_STACK_BYTES
    }

    /// Runs a whole program. The result is the `return` value, else the
    /// completion value of the last expression statement, else `undefined`.
    pub(crate) fn run_program(
        &mut self,
        program: &Program,
        env: &Rc<Env>,
    ) -> Result<Value, ScriptError> {
        self.stack_base = stack_position();
        hoist_vars(&program.body, env);
        self.hoist_functions(&program.body, env);
        match self.exec_stmts(&program.body, env).map_err(Abrupt::into_error)? {
            Flow::Return(value) | Flow::Normal(Some(value)) => Ok(value),
            Flow::Normal(None) => Ok(Value::Undefined),
            Flow::Break | Flow::Continue => Err(ScriptError::syntax("Illegal break statement")),
        }
    }

    fn hoist_functions(&self, stmts: &[Stmt], env: &Rc<Env>) {
        for stmt in stmts {
            if let Stmt::Function(def) = stmt {
                if let Some(name) = &def.name {
                    env.declare(name, closure(def, env), true);
                }
            }
        }
    }

    fn exec_stmts(&mut self, stmts: &[Stmt], env: &Rc<Env>) -> Eval<Flow> {
        let mut last = None;
        for stmt in stmts {
            match self.exec(stmt, env)? {
                Flow::Normal(value) => {
                    if value.is_some() {
                        last = value;
                    }
                }
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &Rc<Env>) -> Eval<Flow> {
        let scope = Env::child(env, false);
        self.hoist_functions(stmts, &scope);
        self.exec_stmts(stmts, &scope)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Rc<Env>) -> Eval<Flow> {
        match stmt {
            Stmt::Expr(expr) => Ok(Flow::Normal(Some(self.eval(expr, env)?))),
            Stmt::Decl { kind, declarators } => {
                for declarator in declarators {
                    let value = match &declarator.init {
                        Some(init) => self.eval(init, env)?,
                        None => Value::Undefined,
                    };
                    match kind {
                        DeclKind::Var => {
                            if declarator.init.is_some() {
                                env.function_env().declare(&declarator.name, value, true);
                            }
                        }
                        DeclKind::Let => env.declare(&declarator.name, value, true),
                        DeclKind::Const => env.declare(&declarator.name, value, false),
                    }
                }
                Ok(Flow::Normal(None))
            }
            Stmt::Function(_) | Stmt::Empty => Ok(Flow::Normal(None)),
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.truthy() {
                    self.exec(consequent, env)
                } else if let Some(alternate) = alternate {
                    self.exec(alternate, env)
                } else {
                    Ok(Flow::Normal(None))
                }
            }
            Stmt::Block(stmts) => self.exec_block(stmts, env),
            Stmt::While { test, body } => {
                let mut last = None;
                while self.eval(test, env)?.truthy() {
                    match loop_control(self.exec(body, env)?, &mut last) {
                        LoopControl::Next => {}
                        LoopControl::Exit => break,
                        LoopControl::Propagate(flow) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal(last))
            }
            Stmt::DoWhile { body, test } => {
                let mut last = None;
                loop {
                    match loop_control(self.exec(body, env)?, &mut last) {
                        LoopControl::Next => {}
                        LoopControl::Exit => break,
                        LoopControl::Propagate(flow) => return Ok(flow),
                    }
                    if !self.eval(test, env)?.truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal(last))
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                let mut scope = Env::child(env, false);
                if let Some(init) = init {
                    self.exec(init, &scope)?;
                }
                let mut last = None;
                loop {
                    if let Some(test) = test {
                        if !self.eval(test, &scope)?.truthy() {
                            break;
                        }
                    }
                    match loop_control(self.exec(body, &scope)?, &mut last) {
                        LoopControl::Next => {}
                        LoopControl::Exit => break,
                        LoopControl::Propagate(flow) => return Ok(flow),
                    }
                    scope = scope.snapshot();
                    if let Some(update) = update {
                        self.eval(update, &scope)?;
                    }
                }
                Ok(Flow::Normal(last))
            }
            Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
            } => {
                let items = match self.eval(iterable, env)? {
                    Value::Array(items) => LoopItems::Live(items),
                    other => LoopItems::Fixed(self.iterate(other)?),
                };
                self.run_for_each(*kind, name, items, body, env)
            }
            Stmt::ForIn {
                kind,
                name,
                object,
                body,
            } => {
                let keys = own_keys(&self.eval(object, env)?)
                    .into_iter()
                    .map(Value::string)
                    .collect();
                self.run_for_each(*kind, name, LoopItems::Fixed(keys), body, env)
            }
            Stmt::Switch {
                discriminant,
                cases,
            } => self.exec_switch(discriminant, cases, env),
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Throw(expr) => Err(Abrupt::Throw {
                value: self.eval(expr, env)?,
                line: expr.line,
            }),
            Stmt::Try {
                block,
                param,
                handler,
                finalizer,
            } => {
                let result = match (self.exec_block(block, env), handler) {
                    (Err(abrupt), Some(handler)) => {
                        let scope = Env::child(env, false);
                        if let Some(param) = param {
                            scope.declare(param, abrupt.into_value(), true);
                        }
                        self.hoist_functions(handler, &scope);
                        self.exec_stmts(handler, &scope)
                    }
                    (result, _) => result,
                };
                if let Some(finalizer) = finalizer {
                    match self.exec_block(finalizer, env)? {
                        Flow::Normal(_) => {}
                        abrupt => return Ok(abrupt),
                    }
                }
                result
            }
        }
    }

    fn run_for_each(
        &mut self,
        kind: DeclKind,
        name: &str,
        items: LoopItems,
        body: &Stmt,
        env: &Rc<Env>,
    ) -> Eval<Flow> {
        let mut last = None;
        let mut index = 0;
        while let Some(item) = items.get(index) {
            index += 1;
            let scope = Env::child(env, false);
            match kind {
                DeclKind::Var => env.function_env().declare(name, item, true),
                DeclKind::Let => scope.declare(name, item, true),
                DeclKind::Const => scope.declare(name, item, false),
            }
            match loop_control(self.exec(body, &scope)?, &mut last) {
                LoopControl::Next => {}
                LoopControl::Exit => break,
                LoopControl::Propagate(flow) => return Ok(flow),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn exec_switch(
        &mut self,
        discriminant: &Expr,
        cases: &[SwitchCase],
        env: &Rc<Env>,
    ) -> Eval<Flow> {
        let value = self.eval(discriminant, env)?;
        let scope = Env::child(env, false);

        let mut start = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if self.eval(test, &scope)?.strict_equals(&value) {
                    start = Some(i);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| cases.iter().position(|c| c.test.is_none())) else {
            return Ok(Flow::Normal(None));
        };

        let mut last = None;
        for case in &cases[start..] {
            for stmt in &case.body {
                match self.exec(stmt, &scope)? {
                    Flow::Normal(value) => {
                        if value.is_some() {
                            last = value;
                        }
                    }
                    Flow::Break => return Ok(Flow::Normal(last)),
                    other => return Ok(other),
                }
            }
        }
        Ok(Flow::Normal(last))
    }

    fn eval(&mut self, expr: &Expr, env: &Rc<Env>) -> Eval<Value> {
        self.eval_inner(expr, env).map_err(|e| e.at_line(expr.line))
    }

    fn eval_inner(&mut self, expr: &Expr, env: &Rc<Env>) -> Eval<Value> {
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::Str(s) => Ok(Value::String(Rc::clone(s))),
            ExprKind::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Expr(e) => out.push_str(&self.eval(e, env)?.to_display_string()),
                    }
                }
                Ok(Value::string(out))
            }
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Undefined => Ok(Value::Undefined),
            ExprKind::Ident(name) => self.lookup(name, env),
            ExprKind::This => Ok(env.lookup("this").unwrap_or_default()),
            ExprKind::Array(items) => Ok(Value::array(self.eval_list(items, env)?)),
            ExprKind::Object(props) => self.eval_object(props, env),
            ExprKind::Function(def) => Ok(closure(def, env)),
            ExprKind::Spread(_) => Err(ScriptError::syntax("Unexpected spread").into()),
            ExprKind::Unary(op, argument) => {
                if *op == UnaryOp::TypeOf {
                    if let ExprKind::Ident(name) = &argument.kind {
                        if self.resolve(name, env).is_none() {
                            return Ok(Value::string("undefined"));
                        }
                    }
                }
                let value = self.eval(argument, env)?;
                Ok(match op {
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Not => Value::Bool(!value.truthy()),
                    UnaryOp::BitNot => Value::Number(!to_int32(value.to_number()) as f64),
                    UnaryOp::TypeOf => Value::string(value.type_of()),
                    UnaryOp::Void => Value::Undefined,
                })
            }
            ExprKind::Update {
                increment,
                prefix,
                target,
            } => {
                let place = self.place(target, env)?;
                let old = self.get_place(&place, env)?.to_number();
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.put_place(place, Value::Number(new), env)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            ExprKind::Binary(op, left, right) => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                Ok(binary(*op, &left, &right)?)
            }
            ExprKind::Logical(op, left, right) => {
                let left = self.eval(left, env)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right, env)
                }
            }
            ExprKind::Assign { op, target, value } => {
                let place = self.place(target, env)?;
                let result = match op {
                    AssignOp::Assign => self.eval(value, env)?,
                    AssignOp::Compound(bop) => {
                        let current = self.get_place(&place, env)?;
                        let rhs = self.eval(value, env)?;
                        binary(*bop, &current, &rhs)?
                    }
                    AssignOp::Logical(lop) => {
                        let current = self.get_place(&place, env)?;
                        let assign = match lop {
                            LogicalOp::And => current.truthy(),
                            LogicalOp::Or => !current.truthy(),
                            LogicalOp::Nullish => current.is_nullish(),
                        };
                        if !assign {
                            return Ok(current);
                        }
                        self.eval(value, env)?
                    }
                };
                self.put_place(place, result.clone(), env)?;
                Ok(result)
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.truthy() {
                    self.eval(consequent, env)
                } else {
                    self.eval(alternate, env)
                }
            }
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                let object = self.eval(object, env)?;
                if *optional && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                Ok(get_named(&object, property)?)
            }
            ExprKind::Index {
                object,
                index,
                optional,
            } => {
                let object = self.eval(object, env)?;
                if *optional && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = self.eval(index, env)?;
                Ok(get_indexed(&object, &key)?)
            }
            ExprKind::Call {
                callee,
                args,
                optional,
            } => self.eval_call(callee, args, *optional, env),
            ExprKind::Sequence(items) => {
                let mut last = Value::Undefined;
                for item in items {
                    last = self.eval(item, env)?;
                }
                Ok(last)
            }
        }
    }

    fn resolve(&self, name: &str, env: &Rc<Env>) -> Option<Value> {
        if let Some(value) = env.lookup(name) {
            return Some(value);
        }
        if name == "globalThis" {
            return Some(self.host.global_object());
        }
        self.host.get(name)
    }

    fn lookup(&self, name: &str, env: &Rc<Env>) -> Eval<Value> {
        self.resolve(name, env)
            .ok_or_else(|| ScriptError::reference(format!("{} is not defined", name)).into())
    }

    fn assign_var(&self, name: &str, value: Value, env: &Rc<Env>) -> Eval<()> {
        match env.assign(name, value.clone()) {
            Some(result) => Ok(result?),
            None if self.host.has(name) => {
                self.host.define(name, value);
                Ok(())
            }
            None => Err(ScriptError::reference(format!("{} is not defined", name)).into()),
        }
    }

    fn place(&mut self, target: &Target, env: &Rc<Env>) -> Eval<Place> {
        Ok(match target {
            Target::Ident(name) => Place::Var(name.clone()),
            Target::Member(object, property) => {
                Place::Prop(self.eval(object, env)?, Value::string(property))
            }
            Target::Index(object, index) => {
                let object = self.eval(object, env)?;
                Place::Prop(object, self.eval(index, env)?)
            }
        })
    }

    fn get_place(&self, place: &Place, env: &Rc<Env>) -> Eval<Value> {
        match place {
            Place::Var(name) => self.lookup(name, env),
            Place::Prop(object, key) => Ok(get_indexed(object, key)?),
        }
    }

    fn put_place(&self, place: Place, value: Value, env: &Rc<Env>) -> Eval<()> {
        match place {
            Place::Var(name) => self.assign_var(&name, value, env),
            Place::Prop(object, key) => Ok(set_indexed(&object, &key, value)?),
        }
    }

    fn eval_list(&mut self, items: &[Expr], env: &Rc<Env>) -> Eval<Vec<Value>> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match &item.kind {
                ExprKind::Spread(inner) => {
                    let value = self.eval(inner, env)?;
                    out.extend(self.iterate(value)?);
                }
                _ => out.push(self.eval(item, env)?),
            }
        }
        Ok(out)
    }

    fn iterate(&self, value: Value) -> Eval<Vec<Value>> {
        match value {
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::String(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
            other => Err(ScriptError::type_error(format!(
                "{} is not iterable",
                other.to_display_string()
            ))
            .into()),
        }
    }

    fn eval_object(&mut self, props: &[ObjectProp], env: &Rc<Env>) -> Eval<Value> {
        let mut object = Object::default();
        for prop in props {
            match prop {
                ObjectProp::Pair(key, value) => {
                    let key = match key {
                        PropKey::Named(name) => name.clone(),
                        PropKey::Computed(expr) => self.eval(expr, env)?.to_display_string(),
                    };
                    let value = self.eval(value, env)?;
                    object.set(&key, value);
                }
                ObjectProp::Spread(expr) => {
                    let source = self.eval(expr, env)?;
                    for key in own_keys(&source) {
                        let value = get_named(&source, &key)?;
                        object.set(&key, value);
                    }
                }
            }
        }
        Ok(Value::Object(Rc::new(RefCell::new(object))))
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        optional: bool,
        env: &Rc<Env>,
    ) -> Eval<Value> {
        let (this, func, args) = match &callee.kind {
            ExprKind::Member {
                object,
                property,
                optional: optional_member,
            } => {
                let object = self.eval(object, env)?;
                if *optional_member && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let args = self.eval_list(args, env)?;
                if let Some(result) = self.call_builtin_method(&object, property, &args)? {
                    return Ok(result);
                }
                let func = get_named(&object, property)?;
                (object, func, args)
            }
            ExprKind::Index {
                object,
                index,
                optional: optional_member,
            } => {
                let object = self.eval(object, env)?;
                if *optional_member && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = self.eval(index, env)?;
                let args = self.eval_list(args, env)?;
                if let Value::String(name) = &key {
                    if let Some(result) = self.call_builtin_method(&object, name, &args)? {
                        return Ok(result);
                    }
                }
                let func = get_indexed(&object, &key)?;
                (object, func, args)
            }
            _ => {
                let func = self.eval(callee, env)?;
                (Value::Undefined, func, self.eval_list(args, env)?)
            }
        };

        if optional && func.is_nullish() {
            return Ok(Value::Undefined);
        }
        if !matches!(func, Value::Function(_)) {
            return Err(ScriptError::type_error(format!(
                "{} is not a function",
                describe_callee(callee)
            ))
            .into());
        }
        self.call_function(&func, this, args)
    }

    fn call_function(&mut self, func: &Value, this: Value, args: Vec<Value>) -> Eval<Value> {
        let Value::Function(function) = func else {
            return Err(ScriptError::type_error(format!(
                "{} is not a function",
                func.to_display_string()
            ))
            .into());
        };
        match &**function {
            Function::Native(native) => Ok(native.call(&args)?),
            Function::Closure(closure) => self.call_closure(closure, this, args),
        }
    }

    fn call_closure(&mut self, closure: &Closure, this: Value, args: Vec<Value>) -> Eval<Value> {
        if self.stack_exhausted() {
            return Err(ScriptError::range("Maximum call stack size exceeded").into());
        }
        let def = &closure.def;
        let env = Env::child(&closure.env, true);
        if !def.arrow {
            env.declare("this", this, false);
        }
        for (i, param) in def.params.iter().enumerate() {
            let value = if param.rest {
                Value::array(args.get(i..).map(<[Value]>::to_vec).unwrap_or_default())
            } else {
                args.get(i).cloned().unwrap_or_default()
            };
            let value = match &param.default {
                Some(default) if matches!(value, Value::Undefined) => self.eval(default, &env)?,
                _ => value,
            };
            env.declare(&param.name, value, true);
        }

        self.depth += 1;
        let result = match &def.body {
            FunctionBody::Expr(expr) => self.eval(expr, &env),
            FunctionBody::Block(stmts) => {
                hoist_vars(stmts, &env);
                self.hoist_functions(stmts, &env);
                self.exec_stmts(stmts, &env).map(|flow| match flow {
                    Flow::Return(value) => value,
                    _ => Value::Undefined,
                })
            }
        };
        self.depth -= 1;
        result
    }

    fn call_builtin_method(
        &mut self,
        object: &Value,
        name: &str,
        args: &[Value],
    ) -> Eval<Option<Value>> {
        match object {
            Value::Array(items) => self.array_method(object, items, name, args),
            Value::String(s) => Ok(string_method(s, name, args)?),
            Value::Number(n) => Ok(number_method(*n, name, args)?),
            _ => Ok(None),
        }
    }

    fn array_method(
        &mut self,
        this: &Value,
        items: &Rc<RefCell<Vec<Value>>>,
        name: &str,
        args: &[Value],
    ) -> Eval<Option<Value>> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or_default();
        let value = match name {
            "push" => {
                let mut items = items.borrow_mut();
                items.extend(args.iter().cloned());
                Value::Number(items.len() as f64)
            }
            "pop" => items.borrow_mut().pop().unwrap_or_default(),
            "join" => {
                let separator = match args.first() {
                    None | Some(Value::Undefined) => ",".to_string(),
                    Some(sep) => sep.to_display_string(),
                };
                Value::string(join_array(items, &separator))
            }
            "indexOf" => {
                let needle = arg(0);
                let position = items.borrow().iter().position(|v| v.strict_equals(&needle));
                Value::Number(position.map_or(-1.0, |i| i as f64))
            }
            "includes" => {
                let needle = arg(0);
                Value::Bool(items.borrow().iter().any(|v| v.same_value_zero(&needle)))
            }
            "slice" => {
                let items = items.borrow();
                let len = items.len();
                let start = relative_index(args.first(), len, 0);
                let end = relative_index(args.get(1), len, len);
                Value::array(items.get(start..end).map(<[Value]>::to_vec).unwrap_or_default())
            }
            "concat" => {
                let mut out = items.borrow().clone();
                for extra in args {
                    match extra {
                        Value::Array(other) => out.extend(other.borrow().iter().cloned()),
                        other => out.push(other.clone()),
                    }
                }
                Value::array(out)
            }
            "map" | "filter" | "forEach" | "some" | "every" | "find" | "reduce" => {
                let callback = arg(0);
                if !matches!(callback, Value::Function(_)) {
                    return Err(ScriptError::type_error(format!(
                        "{} is not a function",
                        callback.to_display_string()
                    ))
                    .into());
                }
                // Callbacks may mutate the array; iterate over a snapshot.
                let snapshot = items.borrow().clone();
                self.array_callback(this, name, &callback, snapshot, args.get(1))?
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    fn array_callback(
        &mut self,
        this: &Value,
        name: &str,
        callback: &Value,
        snapshot: Vec<Value>,
        initial: Option<&Value>,
    ) -> Eval<Value> {
        if name == "reduce" {
            let mut iter = snapshot.into_iter().enumerate();
            let mut acc = match initial {
                Some(initial) => initial.clone(),
                None => match iter.next() {
                    Some((_, first)) => first,
                    None => {
                        return Err(ScriptError::type_error(
                            "Reduce of empty array with no initial value",
                        )
                        .into())
                    }
                },
            };
            for (i, item) in iter {
                let args = vec![acc, item, Value::Number(i as f64), this.clone()];
                acc = self.call_function(callback, Value::Undefined, args)?;
            }
            return Ok(acc);
        }

        let mut mapped = Vec::new();
        for (i, item) in snapshot.into_iter().enumerate() {
            let args = vec![item.clone(), Value::Number(i as f64), this.clone()];
            let result = self.call_function(callback, Value::Undefined, args)?;
            match name {
                "map" => mapped.push(result),
                "filter" if result.truthy() => mapped.push(item),
                "some" if result.truthy() => return Ok(Value::Bool(true)),
                "every" if !result.truthy() => return Ok(Value::Bool(false)),
                "find" if result.truthy() => return Ok(item),
                _ => {}
            }
        }
        Ok(match name {
            "map" | "filter" => Value::array(mapped),
            "some" => Value::Bool(false),
            "every" => Value::Bool(true),
            _ => Value::Undefined,
        })
    }
}

fn closure(def: &Rc<FunctionDef>, env: &Rc<Env>) -> Value {
    Value::Function(Rc::new(Function::Closure(Closure {
        def: Rc::clone(def),
        env: Rc::clone(env),
    })))
}

/// Declares every `var` reachable without crossing a function boundary.
fn hoist_vars(stmts: &[Stmt], env: &Rc<Env>) {
    let mut declare = |name: &str| {
        if !env.has_own(name) {
            env.declare(name, Value::Undefined, true);
        }
    };
    fn walk(stmt: &Stmt, declare: &mut dyn FnMut(&str)) {
        match stmt {
            Stmt::Decl {
                kind: DeclKind::Var,
                declarators,
            } => declarators.iter().for_each(|d| declare(&d.name)),
            Stmt::ForOf {
                kind, name, body, ..
            }
            | Stmt::ForIn {
                kind, name, body, ..
            } => {
                if *kind == DeclKind::Var {
                    declare(name);
                }
                walk(body, declare);
            }
            Stmt::Block(stmts) => stmts.iter().for_each(|s| walk(s, declare)),
            Stmt::If {
                consequent,
                alternate,
                ..
            } => {
                walk(consequent, declare);
                if let Some(alternate) = alternate {
                    walk(alternate, declare);
                }
            }
            Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => walk(body, declare),
            Stmt::For { init, body, .. } => {
                if let Some(init) = init {
                    walk(init, declare);
                }
                walk(body, declare);
            }
            Stmt::Switch { cases, .. } => cases
                .iter()
                .flat_map(|c| c.body.iter())
                .for_each(|s| walk(s, declare)),
            Stmt::Try {
                block,
                handler,
                finalizer,
                ..
            } => {
                block.iter().for_each(|s| walk(s, declare));
                for stmts in [handler, finalizer].into_iter().flatten() {
                    stmts.iter().for_each(|s| walk(s, declare));
                }
            }
            _ => {}
        }
    }
    for stmt in stmts {
        walk(stmt, &mut declare);
    }
}

fn describe_callee(callee: &Expr) -> String {
    match &callee.kind {
        ExprKind::Ident(name) => name.clone(),
        ExprKind::Member {
            object, property, ..
        } => format!("{}.{}", describe_callee(object), property),
        ExprKind::Index { object, .. } => format!("{}[...]", describe_callee(object)),
        ExprKind::Call { callee, .. } => format!("{}(...)", describe_callee(callee)),
        ExprKind::This => "this".to_string(),
        ExprKind::Str(s) => format!("{:?}", s),
        ExprKind::Number(n) => number_to_string(*n),
        ExprKind::Bool(b) => b.to_string(),
        ExprKind::Null => "null".to_string(),
        ExprKind::Array(_) => "[...]".to_string(),
        ExprKind::Object(_) => "{...}".to_string(),
        _ => "expression".to_string(),
    }
}

pub(crate) fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) | Value::Function(_) => {
            Value::string(value.to_display_string())
        }
        other => other.clone(),
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    let (a, b) = (to_primitive(a), to_primitive(b));
    match (&a, &b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => a.to_number().partial_cmp(&b.to_number()),
    }
}

fn binary(op: BinaryOp, a: &Value, b: &Value) -> Result<Value, ScriptError> {
    let num = |f: fn(f64, f64) -> f64| Value::Number(f(a.to_number(), b.to_number()));
    let int = |f: fn(i32, u32) -> f64| Value::Number(f(to_int32(a.to_number()), to_uint32(b.to_number())));
    let ord = compare(a, b);
    Ok(match op {
        BinaryOp::Add => {
            let (a, b) = (to_primitive(a), to_primitive(b));
            if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
                Value::string(format!("{}{}", a.to_display_string(), b.to_display_string()))
            } else {
                Value::Number(a.to_number() + b.to_number())
            }
        }
        BinaryOp::Sub => num(|x, y| x - y),
        BinaryOp::Mul => num(|x, y| x * y),
        BinaryOp::Div => num(|x, y| x / y),
        BinaryOp::Rem => num(|x, y| x % y),
        BinaryOp::Exp => num(|x, y| if y.is_nan() { f64::NAN } else { x.powf(y) }),
        BinaryOp::Eq => Value::Bool(a.loose_equals(b)),
        BinaryOp::NotEq => Value::Bool(!a.loose_equals(b)),
        BinaryOp::StrictEq => Value::Bool(a.strict_equals(b)),
        BinaryOp::StrictNotEq => Value::Bool(!a.strict_equals(b)),
        BinaryOp::Lt => Value::Bool(ord == Some(Ordering::Less)),
        BinaryOp::LtEq => Value::Bool(matches!(ord, Some(Ordering::Less | Ordering::Equal))),
        BinaryOp::Gt => Value::Bool(ord == Some(Ordering::Greater)),
        BinaryOp::GtEq => Value::Bool(matches!(ord, Some(Ordering::Greater | Ordering::Equal))),
        BinaryOp::BitAnd => int(|x, y| (x & y as i32) as f64),
        BinaryOp::BitOr => int(|x, y| (x | y as i32) as f64),
        BinaryOp::BitXor => int(|x, y| (x ^ y as i32) as f64),
        BinaryOp::Shl => int(|x, y| x.wrapping_shl(y & 31) as f64),
        BinaryOp::Shr => int(|x, y| x.wrapping_shr(y & 31) as f64),
        BinaryOp::UShr => int(|x, y| (x as u32).wrapping_shr(y & 31) as f64),
        BinaryOp::In => {
            if !matches!(b, Value::Array(_) | Value::Object(_)) {
                return Err(ScriptError::type_error(format!(
                    "Cannot use 'in' operator to search for '{}' in {}",
                    a.to_display_string(),
                    b.to_display_string()
                )));
            }
            let key = a.to_display_string();
            Value::Bool((key == "length" && matches!(b, Value::Array(_))) || own_keys(b).contains(&key))
        }
    })
}

fn array_index(key: &str) -> Option<usize> {
    let index = key.parse::<usize>().ok()?;
    (index.to_string() == key).then_some(index)
}

fn own_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => (0..items.borrow().len()).map(|i| i.to_string()).collect(),
        Value::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
        Value::Object(object) => object.borrow().entries().map(|(k, _)| k.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn get_named(object: &Value, name: &str) -> Result<Value, ScriptError> {
    Ok(match object {
        Value::Undefined | Value::Null => {
            return Err(ScriptError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                object.to_display_string(),
                name
            )))
        }
        Value::Array(items) => {
            let items = items.borrow();
            if name == "length" {
                Value::Number(items.len() as f64)
            } else {
                array_index(name)
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default()
            }
        }
        Value::String(s) => {
            if name == "length" {
                Value::Number(s.chars().count() as f64)
            } else {
                array_index(name)
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::string(c.to_string()))
                    .unwrap_or_default()
            }
        }
        Value::Object(props) => props.borrow().get(name).cloned().unwrap_or_default(),
        Value::Function(f) if name == "name" => Value::string(f.name()),
        _ => Value::Undefined,
    })
}

fn get_indexed(object: &Value, key: &Value) -> Result<Value, ScriptError> {
    match key {
        Value::Number(n) => get_named(object, &number_to_string(*n)),
        Value::String(s) => get_named(object, s),
        other => get_named(object, &other.to_display_string()),
    }
}

fn set_indexed(object: &Value, key: &Value, value: Value) -> Result<(), ScriptError> {
    let name = key.to_display_string();
    match object {
        Value::Undefined | Value::Null => Err(ScriptError::type_error(format!(
            "Cannot set properties of {} (setting '{}')",
            object.to_display_string(),
            name
        ))),
        Value::Array(items) => {
            if name == "length" {
                let len = value.to_number();
                if len < 0.0 || len.fract() != 0.0 || len as usize > MAX_ARRAY_LENGTH {
                    return Err(ScriptError::range("Invalid array length"));
                }
                items.borrow_mut().resize(len as usize, Value::Undefined);
                return Ok(());
            }
            let Some(index) = array_index(&name) else {
                return Err(ScriptError::type_error(format!(
                    "Cannot create property '{}' on array",
                    name
                )));
            };
            if index >= MAX_ARRAY_LENGTH {
                return Err(ScriptError::range("Invalid array length"));
            }
            let mut items = items.borrow_mut();
            if index >= items.len() {
                items.resize(index + 1, Value::Undefined);
            }
            items[index] = value;
            Ok(())
        }
        Value::Object(props) => {
            props.borrow_mut().set(&name, value);
            Ok(())
        }
        other => Err(ScriptError::type_error(format!(
            "Cannot create property '{}' on {} '{}'",
            name,
            other.type_of(),
            other.to_display_string()
        ))),
    }
}

/// Resolves a possibly negative `slice`-style index against `len`.
fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    match value {
        None | Some(Value::Undefined) => default,
        Some(value) => {
            let n = value.to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            if n < 0.0 {
                (len as f64 + n).max(0.0) as usize
            } else {
                (n as usize).min(len)
            }
        }
    }
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Result<Option<Value>, ScriptError> {
    let text_arg = |i: usize| match args.get(i) {
        Some(v) => v.to_display_string(),
        None => "undefined".to_string(),
    };
    let value = match name {
        "toUpperCase" => Value::string(s.to_uppercase()),
        "toLowerCase" => Value::string(s.to_lowercase()),
        "trim" => Value::string(s.trim()),
        "charAt" => {
            let index = args.first().map_or(0.0, Value::to_number);
            let index = if index.is_nan() { 0.0 } else { index.trunc() };
            let ch = if index < 0.0 {
                None
            } else {
                s.chars().nth(index as usize)
            };
            Value::string(ch.map(String::from).unwrap_or_default())
        }
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let start = relative_index(args.first(), chars.len(), 0);
            let end = relative_index(args.get(1), chars.len(), chars.len());
            let sliced: String = chars.get(start..end).unwrap_or_default().iter().collect();
            Value::string(sliced)
        }
        "includes" => Value::Bool(s.contains(text_arg(0).as_str())),
        "startsWith" => Value::Bool(s.starts_with(text_arg(0).as_str())),
        "endsWith" => Value::Bool(s.ends_with(text_arg(0).as_str())),
        "indexOf" => {
            let position = s.find(text_arg(0).as_str()).map(|byte| s[..byte].chars().count());
            Value::Number(position.map_or(-1.0, |i| i as f64))
        }
        "split" => {
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::Undefined) => vec![Value::string(s)],
                Some(separator) => {
                    let separator = separator.to_display_string();
                    if separator.is_empty() {
                        s.chars().map(|c| Value::string(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str()).map(Value::string).collect()
                    }
                }
            };
            Value::array(parts)
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Result<Option<Value>, ScriptError> {
    let value = match name {
        "toFixed" => {
            let digits = args.first().map_or(0.0, Value::to_number);
            let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
            if !(0.0..=100.0).contains(&digits) {
                return Err(ScriptError::range(
                    "toFixed() digits argument must be between 0 and 100",
                ));
            }
            Value::string(format!("{:.*}", digits as usize, n))
        }
        "toString" => Value::string(number_to_string(n)),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

#[cfg(test)]
#[path = "../../tests/unit/script/interp.rs"]
mod tests;
