//! TypeScript → JavaScript emit: type-only syntax is cut out, everything
//! else is copied byte for byte.

use super::analysis::parse;
use crate::kernel::language::LanguageId;
use crate::kernel::services::ports::LanguageError;
use std::ops::Range;
use tree_sitter::Node;

pub fn emit_javascript(language: LanguageId, text: &str) -> Result<String, LanguageError> {
    if language == LanguageId::JavaScript {
        return Ok(text.to_string());
    }

    let tree = parse(language, text)?;
    let mut cuts = Vec::new();
    collect_cuts(tree.root_node(), &mut cuts);
    cuts.sort_by_key(|r| r.start);

    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for cut in cuts {
        if cut.start < pos {
            pos = pos.max(cut.end);
            continue;
        }
        out.push_str(&text[pos..cut.start]);
        pos = cut.end;
    }
    out.push_str(&text[pos..]);
    Ok(out)
}

fn is_type_only(kind: &str) -> bool {
    matches!(
        kind,
        "type_annotation"
            | "type_predicate_annotation"
            | "asserts_annotation"
            | "type_parameters"
            | "type_arguments"
            | "interface_declaration"
            | "type_alias_declaration"
            | "ambient_declaration"
            | "accessibility_modifier"
    )
}

fn collect_cuts(node: Node<'_>, cuts: &mut Vec<Range<usize>>) {
    let kind = node.kind();
    if is_type_only(kind) {
        cuts.push(node.byte_range());
        return;
    }

    match kind {
        "export_statement" => {
            if node
                .child_by_field_name("declaration")
                .is_some_and(|decl| is_type_only(decl.kind()))
            {
                cuts.push(node.byte_range());
                return;
            }
        }
        "as_expression" | "satisfies_expression" | "non_null_expression" => {
            if let Some(expr) = node.named_child(0) {
                cuts.push(expr.end_byte()..node.end_byte());
                collect_cuts(expr, cuts);
                return;
            }
        }
        "optional_parameter" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if !child.is_named() && child.kind() == "?" {
                    cuts.push(child.byte_range());
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_cuts(child, cuts);
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/language/emit.rs"]
mod tests;
