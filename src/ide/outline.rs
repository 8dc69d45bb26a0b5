//! Code outlining.
//!
//! One collapsible region per declaration body and per standalone block,
//! in document order. Character offsets are resolved through the parse
//! result's own token sequence, never another's.

use text_size::TextRange;

use crate::lexer::Token;
use crate::syntax::{NodeKind, ParseResult, StructuralNode};

/// A collapsible span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineRegion {
    pub range: TextRange,
    pub collapsed_by_default: bool,
}

/// Collect the outline regions of a parse result.
pub fn outline_regions(result: &ParseResult) -> Vec<OutlineRegion> {
    let tokens = result.tokens();
    let mut regions = Vec::new();
    collect(result.root(), NodeKind::SourceFile, tokens, &mut regions);
    regions
}

fn collect(
    node: &StructuralNode,
    parent: NodeKind,
    tokens: &[Token],
    regions: &mut Vec<OutlineRegion>,
) {
    match node.kind {
        // A declaration collapses at its body.
        NodeKind::TypeDecl | NodeKind::MemberDecl => {
            if let Some(body) = node.children.iter().find(|c| c.kind == NodeKind::Block) {
                regions.push(OutlineRegion {
                    range: body.range(tokens),
                    collapsed_by_default: false,
                });
            }
        }
        // A block not serving as a declaration body collapses on its own.
        NodeKind::Block if !parent.is_declaration() => {
            regions.push(OutlineRegion {
                range: node.range(tokens),
                collapsed_by_default: false,
            });
        }
        NodeKind::Block | NodeKind::SourceFile => {}
    }

    for child in &node.children {
        collect(child, node.kind, tokens, regions);
    }
}

#[cfg(test)]
mod tests {
    use crate::base::Snapshot;
    use crate::syntax::parse;

    use super::*;

    fn region_texts(text: &str) -> Vec<String> {
        let result = parse(Snapshot::new(text));
        outline_regions(&result)
            .into_iter()
            .map(|r| text[r.range].to_string())
            .collect()
    }

    #[test]
    fn test_declaration_body_is_collapsible() {
        assert_eq!(region_texts("type T { fn f() }"), vec!["{ fn f() }"]);
    }

    #[test]
    fn test_nested_regions_in_document_order() {
        let regions = region_texts("type A { fn f() { let x = 1; } }");
        assert_eq!(
            regions,
            vec!["{ fn f() { let x = 1; } }", "{ let x = 1; }"]
        );
    }

    #[test]
    fn test_standalone_block() {
        assert_eq!(region_texts("{ let x = 1; }"), vec!["{ let x = 1; }"]);
    }

    #[test]
    fn test_bodyless_declaration_has_no_region() {
        assert!(region_texts("type Marker;").is_empty());
    }
}
