//! Symbol navigation.
//!
//! One jump target per named declaration, with a qualified display name
//! built from the enclosing declarations, plus the implicit "Global Scope"
//! target covering the whole buffer. The seek span points at the name
//! token so the caret lands on the identifier, falling back to the full
//! span for anonymous declarations.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::lexer::{Token, TokenKind};
use crate::syntax::{NodeKind, ParseResult, StructuralNode};

/// What a target navigates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Type,
    Member,
}

/// Glyph to render next to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    Namespace,
    Class,
    Interface,
    Method,
}

/// A named jump target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    /// Qualified display name (`Outer.Inner`).
    pub name: SmolStr,
    pub kind: TargetKind,
    /// Span of the whole declaration.
    pub full_range: TextRange,
    /// Where to place the caret when navigating.
    pub seek_range: TextRange,
    pub icon: IconKind,
}

/// Collect every navigation target of a parse result, global scope first,
/// declarations in document order.
pub fn navigation_targets(result: &ParseResult) -> Vec<NavigationTarget> {
    let tokens = result.tokens();
    let text = result.snapshot().text();

    // The global scope target is always present, covering the whole buffer.
    let mut targets = vec![NavigationTarget {
        name: SmolStr::new("Global Scope"),
        kind: TargetKind::Type,
        full_range: result.snapshot().full_range(),
        seek_range: TextRange::empty(TextSize::new(0)),
        icon: IconKind::Namespace,
    }];

    let mut path: Vec<String> = Vec::new();
    collect(result.root(), &mut path, tokens, text, &mut targets);
    targets
}

/// Targets of one kind, in the same order `navigation_targets` yields them.
pub fn targets_of_kind(result: &ParseResult, kind: TargetKind) -> Vec<NavigationTarget> {
    navigation_targets(result)
        .into_iter()
        .filter(|t| t.kind == kind)
        .collect()
}

fn collect(
    node: &StructuralNode,
    path: &mut Vec<String>,
    tokens: &[Token],
    text: &str,
    targets: &mut Vec<NavigationTarget>,
) {
    if !node.kind.is_declaration() {
        for child in &node.children {
            collect(child, path, tokens, text, targets);
        }
        return;
    }

    let name_token = node.name_token.and_then(|i| tokens.get(i));
    let name = name_token.map_or("?", |t| t.text(text));
    let qualified = if path.is_empty() {
        SmolStr::new(name)
    } else {
        SmolStr::new(format!("{}.{}", path.join("."), name))
    };

    let full_range = node.range(tokens);
    let seek_range = name_token.map_or(full_range, |t| TextRange::empty(t.offset));

    let (kind, icon) = if node.kind == NodeKind::TypeDecl {
        let is_interface = tokens
            .get(node.first_token)
            .is_some_and(|t| t.kind == TokenKind::InterfaceKw);
        let icon = if is_interface {
            IconKind::Interface
        } else {
            IconKind::Class
        };
        (TargetKind::Type, icon)
    } else {
        (TargetKind::Member, IconKind::Method)
    };

    targets.push(NavigationTarget {
        name: qualified,
        kind,
        full_range,
        seek_range,
        icon,
    });

    path.push(name.to_string());
    for child in &node.children {
        collect(child, path, tokens, text, targets);
    }
    path.pop();
}

#[cfg(test)]
mod tests {
    use crate::base::Snapshot;
    use crate::syntax::parse;

    use super::*;

    fn targets(text: &str) -> Vec<NavigationTarget> {
        navigation_targets(&parse(Snapshot::new(text)))
    }

    #[test]
    fn test_global_scope_is_always_first() {
        let targets = targets("");
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "Global Scope");
        assert_eq!(targets[0].kind, TargetKind::Type);
        assert_eq!(targets[0].icon, IconKind::Namespace);
    }

    #[test]
    fn test_nested_names_are_qualified() {
        let targets = targets("type Outer { type Inner { } }");
        let names: Vec<_> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Global Scope", "Outer", "Outer.Inner"]);
    }

    #[test]
    fn test_member_inside_type() {
        let text = "type Car { fn start() { } }";
        let targets = targets(text);
        let member = &targets[2];
        assert_eq!(member.name, "Car.start");
        assert_eq!(member.kind, TargetKind::Member);
        assert_eq!(member.icon, IconKind::Method);
        // Seek lands on the identifier, not the keyword.
        assert_eq!(
            usize::from(member.seek_range.start()),
            text.find("start").unwrap()
        );
        assert!(member.seek_range.is_empty());
    }

    #[test]
    fn test_interface_icon() {
        let targets = targets("interface Drivable { }");
        assert_eq!(targets[1].icon, IconKind::Interface);
        assert_eq!(targets[1].kind, TargetKind::Type);
    }

    #[test]
    fn test_anonymous_declaration_falls_back_to_full_span() {
        let targets = targets("type { }");
        assert_eq!(targets[1].name, "?");
        assert_eq!(targets[1].seek_range, targets[1].full_range);
    }

    #[test]
    fn test_targets_of_kind_filters() {
        let result = parse(Snapshot::new("type A { fn f() { } }\nfn g() { }"));
        let types = targets_of_kind(&result, TargetKind::Type);
        let members = targets_of_kind(&result, TargetKind::Member);
        assert_eq!(types.len(), 2); // Global Scope + A
        assert_eq!(
            members.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["A.f", "g"]
        );
    }
}
