//! Lowers the tree-sitter JavaScript CST into the owned [`ast`](super::ast).
//!
//! Anything outside the supported subset is rejected up front with a
//! `SyntaxError`, so the interpreter never sees an unknown node.

use super::ast::*;
use super::error::ScriptError;
use super::value::number_to_string;
use crate::kernel::language::LanguageId;
use crate::kernel::services::adapters::language::parse;
use std::rc::Rc;
use tree_sitter::Node;

pub fn lower_program(code: &str) -> Result<Program, ScriptError> {
    let tree = parse(LanguageId::JavaScript, code).map_err(|e| ScriptError::syntax(e.to_string()))?;
    let root = tree.root_node();
    if root.has_error() {
        let (line, what) = match first_error(root) {
            Some(node) if node.is_missing() => (line_of(node), format!("missing '{}'", node.kind())),
            Some(node) => (line_of(node), "unexpected token".to_string()),
            None => (1, "unexpected token".to_string()),
        };
        return Err(ScriptError::syntax(what).at_line(line));
    }

    let lowerer = Lowerer { src: code };
    let body = lowerer.statements(root)?;
    Ok(Program { body })
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error() || c.is_missing())
        .find_map(first_error)
}

fn line_of(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

fn named<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

fn unsupported(node: Node<'_>) -> ScriptError {
    ScriptError::syntax(format!("unsupported syntax: {}", node.kind())).at_line(line_of(node))
}

struct Lowerer<'s> {
    src: &'s str,
}

impl<'s> Lowerer<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        &self.src[node.byte_range()]
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>, ScriptError> {
        node.child_by_field_name(name).ok_or_else(|| {
            ScriptError::syntax(format!("{} without {}", node.kind(), name)).at_line(line_of(node))
        })
    }

    fn first_named<'t>(&self, node: Node<'t>) -> Result<Node<'t>, ScriptError> {
        named(node)
            .into_iter()
            .next()
            .ok_or_else(|| unsupported(node))
    }

    fn statements(&self, node: Node<'_>) -> Result<Vec<Stmt>, ScriptError> {
        named(node).into_iter().map(|n| self.stmt(n)).collect()
    }

    fn stmt(&self, node: Node<'_>) -> Result<Stmt, ScriptError> {
        let stmt = match node.kind() {
            "expression_statement" => Stmt::Expr(self.expr(self.first_named(node)?)?),
            "lexical_declaration" | "variable_declaration" => self.declaration(node)?,
            "function_declaration" => Stmt::Function(Rc::new(self.function(node)?)),
            "return_statement" => match named(node).into_iter().next() {
                Some(value) => Stmt::Return(Some(self.expr(value)?)),
                None => Stmt::Return(None),
            },
            "if_statement" => {
                let alternate = match node.child_by_field_name("alternative") {
                    Some(clause) => Some(Box::new(self.stmt(self.first_named(clause)?)?)),
                    None => None,
                };
                Stmt::If {
                    test: self.expr(self.field(node, "condition")?)?,
                    consequent: Box::new(self.stmt(self.field(node, "consequence")?)?),
                    alternate,
                }
            }
            "statement_block" => Stmt::Block(self.statements(node)?),
            "while_statement" => Stmt::While {
                test: self.expr(self.field(node, "condition")?)?,
                body: Box::new(self.stmt(self.field(node, "body")?)?),
            },
            "do_statement" => Stmt::DoWhile {
                body: Box::new(self.stmt(self.field(node, "body")?)?),
                test: self.expr(self.field(node, "condition")?)?,
            },
            "for_statement" => self.for_statement(node)?,
            "for_in_statement" => self.for_in_statement(node)?,
            "switch_statement" => self.switch_statement(node)?,
            "break_statement" | "continue_statement" => {
                if node.child_by_field_name("label").is_some() {
                    return Err(unsupported(node));
                }
                if node.kind() == "break_statement" {
                    Stmt::Break
                } else {
                    Stmt::Continue
                }
            }
            "throw_statement" => Stmt::Throw(self.expr(self.first_named(node)?)?),
            "try_statement" => self.try_statement(node)?,
            "empty_statement" => Stmt::Empty,
            _ => return Err(unsupported(node)),
        };
        Ok(stmt)
    }

    fn declaration(&self, node: Node<'_>) -> Result<Stmt, ScriptError> {
        let kind = match node.child(0).map(|c| c.kind()) {
            Some("const") => DeclKind::Const,
            Some("let") => DeclKind::Let,
            _ => DeclKind::Var,
        };
        let mut declarators = Vec::new();
        for declarator in named(node) {
            let name = self.field(declarator, "name")?;
            if name.kind() != "identifier" {
                return Err(unsupported(name));
            }
            let init = match declarator.child_by_field_name("value") {
                Some(value) => Some(self.expr(value)?),
                None => None,
            };
            if kind == DeclKind::Const && init.is_none() {
                return Err(ScriptError::syntax("Missing initializer in const declaration")
                    .at_line(line_of(declarator)));
            }
            declarators.push(Declarator {
                name: self.text(name).to_string(),
                init,
                line: line_of(declarator),
            });
        }
        Ok(Stmt::Decl { kind, declarators })
    }

    fn for_statement(&self, node: Node<'_>) -> Result<Stmt, ScriptError> {
        let init = match node.child_by_field_name("initializer") {
            Some(n) if n.kind() == "empty_statement" => None,
            Some(n) if n.kind().ends_with("statement") || n.kind().ends_with("declaration") => {
                Some(Box::new(self.stmt(n)?))
            }
            Some(n) => Some(Box::new(Stmt::Expr(self.expr(n)?))),
            None => None,
        };
        let test = match node.child_by_field_name("condition") {
            Some(n) if n.kind() == "empty_statement" => None,
            Some(n) if n.kind() == "expression_statement" => Some(self.expr(self.first_named(n)?)?),
            Some(n) => Some(self.expr(n)?),
            None => None,
        };
        let update = match node.child_by_field_name("increment") {
            Some(n) => Some(self.expr(n)?),
            None => None,
        };
        Ok(Stmt::For {
            init,
            test,
            update,
            body: Box::new(self.stmt(self.field(node, "body")?)?),
        })
    }

    fn for_in_statement(&self, node: Node<'_>) -> Result<Stmt, ScriptError> {
        let kind = match node.child_by_field_name("kind").map(|k| self.text(k)) {
            Some("const") => DeclKind::Const,
            Some("let") => DeclKind::Let,
            Some("var") => DeclKind::Var,
            _ => return Err(unsupported(node)),
        };
        let left = self.field(node, "left")?;
        if left.kind() != "identifier" {
            return Err(unsupported(left));
        }
        let name = self.text(left).to_string();
        let right = self.expr(self.field(node, "right")?)?;
        let body = Box::new(self.stmt(self.field(node, "body")?)?);

        match node.child_by_field_name("operator").map(|o| o.kind()) {
            Some("of") => Ok(Stmt::ForOf {
                kind,
                name,
                iterable: right,
                body,
            }),
            Some("in") => Ok(Stmt::ForIn {
                kind,
                name,
                object: right,
                body,
            }),
            _ => Err(unsupported(node)),
        }
    }

    fn switch_statement(&self, node: Node<'_>) -> Result<Stmt, ScriptError> {
        let discriminant = self.expr(self.field(node, "value")?)?;
        let mut cases = Vec::new();
        for case in named(self.field(node, "body")?) {
            let value = case.child_by_field_name("value");
            let test = match value {
                Some(v) => Some(self.expr(v)?),
                None => None,
            };
            let body = named(case)
                .into_iter()
                .filter(|c| value.map_or(true, |v| v.id() != c.id()))
                .map(|c| self.stmt(c))
                .collect::<Result<Vec<_>, _>>()?;
            cases.push(SwitchCase { test, body });
        }
        Ok(Stmt::Switch {
            discriminant,
            cases,
        })
    }

    fn try_statement(&self, node: Node<'_>) -> Result<Stmt, ScriptError> {
        let block = self.statements(self.field(node, "body")?)?;
        let (param, handler) = match node.child_by_field_name("handler") {
            Some(clause) => {
                let param = match clause.child_by_field_name("parameter") {
                    Some(p) if p.kind() == "identifier" => Some(self.text(p).to_string()),
                    Some(p) => return Err(unsupported(p)),
                    None => None,
                };
                (param, Some(self.statements(self.field(clause, "body")?)?))
            }
            None => (None, None),
        };
        let finalizer = match node.child_by_field_name("finalizer") {
            Some(clause) => Some(self.statements(self.field(clause, "body")?)?),
            None => None,
        };
        Ok(Stmt::Try {
            block,
            param,
            handler,
            finalizer,
        })
    }

    fn function(&self, node: Node<'_>) -> Result<FunctionDef, ScriptError> {
        if node.child(0).is_some_and(|c| c.kind() == "async") {
            return Err(unsupported(node));
        }
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string());

        let params = match node.child_by_field_name("parameter") {
            Some(single) => vec![self.param(single)?],
            None => named(self.field(node, "parameters")?)
                .into_iter()
                .map(|p| self.param(p))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let body = self.field(node, "body")?;
        let body = if body.kind() == "statement_block" {
            FunctionBody::Block(self.statements(body)?)
        } else {
            FunctionBody::Expr(Box::new(self.expr(body)?))
        };

        Ok(FunctionDef {
            name,
            params,
            body,
            arrow: node.kind() == "arrow_function",
        })
    }

    fn param(&self, node: Node<'_>) -> Result<Param, ScriptError> {
        match node.kind() {
            "identifier" => Ok(Param {
                name: self.text(node).to_string(),
                default: None,
                rest: false,
            }),
            "assignment_pattern" => {
                let left = self.field(node, "left")?;
                if left.kind() != "identifier" {
                    return Err(unsupported(left));
                }
                Ok(Param {
                    name: self.text(left).to_string(),
                    default: Some(self.expr(self.field(node, "right")?)?),
                    rest: false,
                })
            }
            "rest_pattern" => {
                let inner = self.first_named(node)?;
                if inner.kind() != "identifier" {
                    return Err(unsupported(inner));
                }
                Ok(Param {
                    name: self.text(inner).to_string(),
                    default: None,
                    rest: true,
                })
            }
            _ => Err(unsupported(node)),
        }
    }

    fn target(&self, node: Node<'_>) -> Result<Target, ScriptError> {
        match node.kind() {
            "identifier" => Ok(Target::Ident(self.text(node).to_string())),
            "parenthesized_expression" => self.target(self.first_named(node)?),
            "member_expression" if node.child_by_field_name("optional_chain").is_none() => {
                Ok(Target::Member(
                    Box::new(self.expr(self.field(node, "object")?)?),
                    self.property_name(self.field(node, "property")?)?,
                ))
            }
            "subscript_expression" if node.child_by_field_name("optional_chain").is_none() => {
                Ok(Target::Index(
                    Box::new(self.expr(self.field(node, "object")?)?),
                    Box::new(self.expr(self.field(node, "index")?)?),
                ))
            }
            _ => Err(
                ScriptError::syntax("Invalid left-hand side in assignment").at_line(line_of(node))
            ),
        }
    }

    fn property_name(&self, node: Node<'_>) -> Result<String, ScriptError> {
        match node.kind() {
            "property_identifier" | "identifier" => Ok(self.text(node).to_string()),
            _ => Err(unsupported(node)),
        }
    }

    fn expr(&self, node: Node<'_>) -> Result<Expr, ScriptError> {
        let line = line_of(node);
        let kind = match node.kind() {
            "parenthesized_expression" => return self.expr(self.first_named(node)?),
            "number" => ExprKind::Number(self.number(node)?),
            "string" => {
                let raw = self.text(node);
                let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
                ExprKind::Str(Rc::from(unescape(inner, line)?))
            }
            "template_string" => ExprKind::Template(self.template(node)?),
            "true" => ExprKind::Bool(true),
            "false" => ExprKind::Bool(false),
            "null" => ExprKind::Null,
            "undefined" => ExprKind::Undefined,
            "identifier" => ExprKind::Ident(self.text(node).to_string()),
            "this" => ExprKind::This,
            "array" => ExprKind::Array(
                named(node)
                    .into_iter()
                    .map(|n| self.expr(n))
                    .collect::<Result<_, _>>()?,
            ),
            "object" => ExprKind::Object(self.object(node)?),
            "function" | "function_expression" | "arrow_function" => {
                ExprKind::Function(Rc::new(self.function(node)?))
            }
            "spread_element" => ExprKind::Spread(Box::new(self.expr(self.first_named(node)?)?)),
            "unary_expression" => {
                let op = match self.field(node, "operator")?.kind() {
                    "-" => UnaryOp::Neg,
                    "+" => UnaryOp::Plus,
                    "!" => UnaryOp::Not,
                    "~" => UnaryOp::BitNot,
                    "typeof" => UnaryOp::TypeOf,
                    "void" => UnaryOp::Void,
                    _ => return Err(unsupported(node)),
                };
                ExprKind::Unary(op, Box::new(self.expr(self.field(node, "argument")?)?))
            }
            "update_expression" => {
                let operator = self.field(node, "operator")?;
                let prefix = node.child(0).is_some_and(|c| c.id() == operator.id());
                ExprKind::Update {
                    increment: operator.kind() == "++",
                    prefix,
                    target: self.target(self.field(node, "argument")?)?,
                }
            }
            "binary_expression" => {
                let left = Box::new(self.expr(self.field(node, "left")?)?);
                let right = Box::new(self.expr(self.field(node, "right")?)?);
                let operator = self.field(node, "operator")?.kind();
                match logical_op(operator) {
                    Some(op) => ExprKind::Logical(op, left, right),
                    None => {
                        let op = binary_op(operator).ok_or_else(|| unsupported(node))?;
                        ExprKind::Binary(op, left, right)
                    }
                }
            }
            "assignment_expression" => ExprKind::Assign {
                op: AssignOp::Assign,
                target: self.target(self.field(node, "left")?)?,
                value: Box::new(self.expr(self.field(node, "right")?)?),
            },
            "augmented_assignment_expression" => {
                let operator = self.field(node, "operator")?.kind();
                let base = operator.strip_suffix('=').unwrap_or(operator);
                let op = match logical_op(base) {
                    Some(op) => AssignOp::Logical(op),
                    None => AssignOp::Compound(binary_op(base).ok_or_else(|| unsupported(node))?),
                };
                ExprKind::Assign {
                    op,
                    target: self.target(self.field(node, "left")?)?,
                    value: Box::new(self.expr(self.field(node, "right")?)?),
                }
            }
            "ternary_expression" => ExprKind::Conditional {
                test: Box::new(self.expr(self.field(node, "condition")?)?),
                consequent: Box::new(self.expr(self.field(node, "consequence")?)?),
                alternate: Box::new(self.expr(self.field(node, "alternative")?)?),
            },
            "member_expression" => ExprKind::Member {
                object: Box::new(self.expr(self.field(node, "object")?)?),
                property: self.property_name(self.field(node, "property")?)?,
                optional: node.child_by_field_name("optional_chain").is_some(),
            },
            "subscript_expression" => ExprKind::Index {
                object: Box::new(self.expr(self.field(node, "object")?)?),
                index: Box::new(self.expr(self.field(node, "index")?)?),
                optional: node.child_by_field_name("optional_chain").is_some(),
            },
            "call_expression" => {
                let arguments = self.field(node, "arguments")?;
                if arguments.kind() != "arguments" {
                    return Err(unsupported(arguments));
                }
                ExprKind::Call {
                    callee: Box::new(self.expr(self.field(node, "function")?)?),
                    args: named(arguments)
                        .into_iter()
                        .map(|a| self.expr(a))
                        .collect::<Result<_, _>>()?,
                    optional: node.child_by_field_name("optional_chain").is_some(),
                }
            }
            "sequence_expression" => {
                let mut items = Vec::new();
                self.flatten_sequence(node, &mut items)?;
                ExprKind::Sequence(items)
            }
            _ => return Err(unsupported(node)),
        };
        Ok(Expr { kind, line })
    }

    fn flatten_sequence(&self, node: Node<'_>, out: &mut Vec<Expr>) -> Result<(), ScriptError> {
        for child in named(node) {
            if child.kind() == "sequence_expression" {
                self.flatten_sequence(child, out)?;
            } else {
                out.push(self.expr(child)?);
            }
        }
        Ok(())
    }

    fn object(&self, node: Node<'_>) -> Result<Vec<ObjectProp>, ScriptError> {
        let mut props = Vec::new();
        for member in named(node) {
            let prop = match member.kind() {
                "pair" => {
                    let key = self.prop_key(self.field(member, "key")?)?;
                    ObjectProp::Pair(key, self.expr(self.field(member, "value")?)?)
                }
                "shorthand_property_identifier" => {
                    let name = self.text(member).to_string();
                    ObjectProp::Pair(
                        PropKey::Named(name.clone()),
                        Expr {
                            kind: ExprKind::Ident(name),
                            line: line_of(member),
                        },
                    )
                }
                "method_definition" => {
                    let mut cursor = member.walk();
                    let accessor = member
                        .children(&mut cursor)
                        .any(|c| matches!(c.kind(), "get" | "set" | "async" | "static" | "*"));
                    if accessor {
                        return Err(unsupported(member));
                    }
                    let key = self.prop_key(self.field(member, "name")?)?;
                    let function = Expr {
                        kind: ExprKind::Function(Rc::new(self.function(member)?)),
                        line: line_of(member),
                    };
                    ObjectProp::Pair(key, function)
                }
                "spread_element" => ObjectProp::Spread(self.expr(self.first_named(member)?)?),
                _ => return Err(unsupported(member)),
            };
            props.push(prop);
        }
        Ok(props)
    }

    fn prop_key(&self, node: Node<'_>) -> Result<PropKey, ScriptError> {
        let line = line_of(node);
        match node.kind() {
            "property_identifier" | "identifier" => Ok(PropKey::Named(self.text(node).to_string())),
            "string" => {
                let raw = self.text(node);
                let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
                Ok(PropKey::Named(unescape(inner, line)?))
            }
            "number" => Ok(PropKey::Named(number_to_string(self.number(node)?))),
            "computed_property_name" => Ok(PropKey::Computed(self.expr(self.first_named(node)?)?)),
            _ => Err(unsupported(node)),
        }
    }

    fn number(&self, node: Node<'_>) -> Result<f64, ScriptError> {
        let raw = self.text(node);
        let line = line_of(node);
        if let Some(message) = legacy_number_error(raw) {
            return Err(ScriptError::syntax(message).at_line(line));
        }
        parse_number(raw)
            .ok_or_else(|| ScriptError::syntax(format!("invalid number {}", raw)).at_line(line))
    }

    fn template(&self, node: Node<'_>) -> Result<Vec<TemplatePart>, ScriptError> {
        let line = line_of(node);
        let mut parts = Vec::new();
        let mut pos = node.start_byte() + 1;
        let end = node.end_byte().saturating_sub(1);

        for child in named(node) {
            if child.kind() != "template_substitution" {
                continue;
            }
            if child.start_byte() > pos {
                parts.push(TemplatePart::Text(unescape(
                    &self.src[pos..child.start_byte()],
                    line,
                )?));
            }
            parts.push(TemplatePart::Expr(self.expr(self.first_named(child)?)?));
            pos = child.end_byte();
        }
        if end > pos {
            parts.push(TemplatePart::Text(unescape(&self.src[pos..end], line)?));
        }
        Ok(parts)
    }
}

fn logical_op(op: &str) -> Option<LogicalOp> {
    match op {
        "&&" => Some(LogicalOp::And),
        "||" => Some(LogicalOp::Or),
        "??" => Some(LogicalOp::Nullish),
        _ => None,
    }
}

fn binary_op(op: &str) -> Option<BinaryOp> {
    let op = match op {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Rem,
        "**" => BinaryOp::Exp,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::NotEq,
        "===" => BinaryOp::StrictEq,
        "!==" => BinaryOp::StrictNotEq,
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::LtEq,
        ">" => BinaryOp::Gt,
        ">=" => BinaryOp::GtEq,
        "&" => BinaryOp::BitAnd,
        "|" => BinaryOp::BitOr,
        "^" => BinaryOp::BitXor,
        "<<" => BinaryOp::Shl,
        ">>" => BinaryOp::Shr,
        ">>>" => BinaryOp::UShr,
        "in" => BinaryOp::In,
        _ => return None,
    };
    Some(op)
}

/// Numeric literal, including `0x`/`0o`/`0b` prefixes and `_` separators.
/// BigInt literals are rejected.
/// Leading-zero integer literals are sloppy-mode only.
fn legacy_number_error(raw: &str) -> Option<&'static str> {
    let mut chars = raw.chars();
    if chars.next() != Some('0') {
        return None;
    }
    let rest = chars.as_str();
    if !rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if rest.chars().all(|c| matches!(c, '0'..='7')) {
        Some("Octal literals are not allowed in strict mode.")
    } else {
        Some("Decimals with leading zeros are not allowed in strict mode.")
    }
}

pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|&c| c != '_').collect();
    if cleaned.ends_with('n') {
        return None;
    }
    let radix = |digits: &str, radix: u32| {
        u64::from_str_radix(digits, radix).ok().map(|v| v as f64)
    };
    let lower = cleaned.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return radix(hex, 16);
    }
    if let Some(oct) = lower.strip_prefix("0o") {
        return radix(oct, 8);
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        return radix(bin, 2);
    }
    cleaned.parse::<f64>().ok()
}

/// Decodes escape sequences of a string or template chunk.
pub(crate) fn unescape(raw: &str, line: u32) -> Result<String, ScriptError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(decode_code_point(&hex, line)?);
            }
            'u' => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|&c| c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                out.push(decode_code_point(&hex, line)?);
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn decode_code_point(hex: &str, line: u32) -> Result<char, ScriptError> {
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| ScriptError::syntax("Invalid escape sequence").at_line(line))
}

#[cfg(test)]
#[path = "../../tests/unit/script/lower.rs"]
mod tests;
