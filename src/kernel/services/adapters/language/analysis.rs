//! Syntax analysis: parse errors become markers under the `syntax` owner.

use crate::kernel::language::LanguageId;
use crate::kernel::services::ports::{LanguageError, Marker};
use tree_sitter::{Node, Parser, Tree};

pub const SYNTAX_OWNER: &str = "syntax";

const MAX_SNIPPET_CHARS: usize = 24;

pub(crate) fn parse(language: LanguageId, text: &str) -> Result<Tree, LanguageError> {
    let mut parser = Parser::new();
    parser
        .set_language(language.grammar())
        .map_err(|e| LanguageError::Parser(format!("{:?}", e)))?;
    parser
        .parse(text, None)
        .ok_or_else(|| LanguageError::Parser("parse cancelled".to_string()))
}

pub fn syntax_markers(language: LanguageId, text: &str) -> Vec<Marker> {
    let tree = match parse(language, text) {
        Ok(tree) => tree,
        Err(e) => return vec![Marker::error(1, 1, e.to_string())],
    };
    let mut out = Vec::new();
    collect_errors(tree.root_node(), text.as_bytes(), &mut out);
    out
}

fn collect_errors(node: Node<'_>, src: &[u8], out: &mut Vec<Marker>) {
    if node.is_missing() {
        out.push(marker_for(node, format!("'{}' expected.", node.kind())));
        return;
    }
    if node.is_error() {
        out.push(marker_for(node, unexpected_message(node, src)));
        return;
    }
    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(child, src, out);
    }
}

fn marker_for(node: Node<'_>, message: String) -> Marker {
    let start = node.start_position();
    let end = node.end_position();
    Marker {
        end_line: end.row as u32 + 1,
        end_col: end.column as u32 + 1,
        ..Marker::error(start.row as u32 + 1, start.column as u32 + 1, message)
    }
}

fn unexpected_message(node: Node<'_>, src: &[u8]) -> String {
    let text = node.utf8_text(src).unwrap_or_default();
    let first_line = text.lines().next().unwrap_or_default().trim();
    if first_line.is_empty() {
        return "Unexpected token.".to_string();
    }
    let snippet: String = first_line.chars().take(MAX_SNIPPET_CHARS).collect();
    if snippet.len() < first_line.len() {
        format!("Unexpected token '{}…'.", snippet)
    } else {
        format!("Unexpected token '{}'.", snippet)
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/language/analysis.rs"]
mod tests;
