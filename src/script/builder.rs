//! Turns emitted JavaScript plus a named scope into a callable.

use super::ast::{DeclKind, Program, Stmt};
use super::error::ScriptError;
use super::host::HostGlobals;
use super::interp::{Env, Interpreter};
use super::lower::lower_program;
use super::value::Value;
use std::rc::Rc;

const RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Ordered name/value pairs. Order decides parameter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    entries: Vec<(String, Value)>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces in place when `name` is already present, keeping its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Splits into the parallel name and value lists passed to
    /// [`ExecutionBuilder::build`].
    pub fn into_parts(self) -> (Vec<String>, Vec<Value>) {
        self.entries.into_iter().unzip()
    }

    /// Builds a scope from a JSON object, keeping key order.
    pub fn from_json(json: serde_json::Value) -> Result<Self, ScriptError> {
        let serde_json::Value::Object(map) = json else {
            return Err(ScriptError::type_error("scope must be a JSON object"));
        };
        let mut scope = Scope::new();
        for (name, value) in map {
            scope.insert(name, Value::from_json(value));
        }
        Ok(scope)
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for Scope {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut scope = Scope::new();
        for (name, value) in iter {
            scope.insert(name, value);
        }
        scope
    }
}

#[derive(Default)]
pub struct ExecutionBuilder {
    host: HostGlobals,
}

impl ExecutionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(host: HostGlobals) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &HostGlobals {
        &self.host
    }

    /// Compiles `code` as the body of a function whose parameters are
    /// `names`, bound to `values` on every call.
    pub fn build(
        &self,
        code: &str,
        names: Vec<String>,
        values: Vec<Value>,
    ) -> Result<ExecutableCallable, ScriptError> {
        if names.len() != values.len() {
            return Err(ScriptError::type_error(format!(
                "expected {} values for {} names",
                names.len(),
                values.len()
            )));
        }
        for (i, name) in names.iter().enumerate() {
            validate_param(name)?;
            if names[..i].contains(name) {
                return Err(ScriptError::syntax(
                    "Duplicate parameter name not allowed in this context",
                ));
            }
        }

        let program = lower_program(code)?;
        if let Some(name) = lexical_names(&program).find(|name| names.contains(name)) {
            return Err(ScriptError::syntax(format!(
                "Identifier '{}' has already been declared",
                name
            )));
        }
        tracing::debug!(params = names.len(), "script compiled");
        Ok(ExecutableCallable {
            program: Rc::new(program),
            params: names,
            args: values,
            host: self.host.clone(),
        })
    }
}

/// Top-level `let`/`const` names; these may not shadow a parameter.
fn lexical_names(program: &Program) -> impl Iterator<Item = &String> {
    program
        .body
        .iter()
        .flat_map(|stmt| match stmt {
            Stmt::Decl {
                kind: DeclKind::Let | DeclKind::Const,
                declarators,
            } => declarators.as_slice(),
            _ => &[],
        })
        .map(|declarator| &declarator.name)
}

fn validate_param(name: &str) -> Result<(), ScriptError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
    let valid_rest = chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if !valid_start || !valid_rest {
        return Err(ScriptError::syntax(format!(
            "Invalid parameter name '{}'",
            name
        )));
    }
    if RESERVED.contains(&name) {
        return Err(ScriptError::syntax(format!(
            "Unexpected reserved word '{}'",
            name
        )));
    }
    Ok(())
}

/// A compiled program with its arguments bound. Each [`call`] runs it in a
/// fresh scope; host globals and console output persist across calls.
///
/// [`call`]: ExecutableCallable::call
pub struct ExecutableCallable {
    program: Rc<Program>,
    params: Vec<String>,
    args: Vec<Value>,
    host: HostGlobals,
}

impl ExecutableCallable {
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn host(&self) -> &HostGlobals {
        &self.host
    }

    pub fn output(&self) -> Vec<String> {
        self.host.output()
    }

    pub fn call(&self) -> Result<Value, ScriptError> {
        let env = Env::root();
        env.declare("this", self.host.global_object(), false);
        for (name, value) in self.params.iter().zip(&self.args) {
            env.declare(name, value.clone(), true);
        }
        let result = Interpreter::new(&self.host).run_program(&self.program, &env);
        if let Err(e) = &result {
            tracing::debug!(error = %e, "script failed");
        }
        result
    }
}

impl std::fmt::Debug for ExecutableCallable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutableCallable")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/builder.rs"]
mod tests;
