//! Structural tree builder.
//!
//! A single pass over the significant tokens with error recovery: stray
//! close braces and malformed declaration headers become diagnostics, never
//! failures. The builder checks its cancellation token once per node
//! visited, so an obsolete run winds down at a consistent point instead of
//! being torn mid-construction.

use text_size::TextRange;
use tokio_util::sync::CancellationToken;

use crate::lexer::{Token, TokenKind};

use super::node::{NodeKind, StructuralNode};
use super::result::{Diagnostic, DiagnosticSink, RunError};

/// Build the structural tree for a token sequence.
///
/// Returns the root node, the collected diagnostics, and whether the
/// diagnostic cap was hit (in which case the tree covers only the tokens
/// visited before the overflow).
pub(crate) fn build(
    tokens: &[Token],
    cancel: &CancellationToken,
) -> Result<(StructuralNode, Vec<Diagnostic>, bool), RunError> {
    let mut builder = TreeBuilder {
        tokens,
        pos: 0,
        stack: vec![Frame::new(NodeKind::SourceFile, 0)],
        sink: DiagnosticSink::default(),
    };

    match builder.run(cancel) {
        Err(Stop::Cancelled) => return Err(RunError::Cancelled),
        Ok(()) | Err(Stop::Overflow) => {}
    }

    Ok(builder.finish())
}

enum Stop {
    Cancelled,
    Overflow,
}

struct Frame {
    kind: NodeKind,
    first_token: usize,
    name_token: Option<usize>,
    children: Vec<StructuralNode>,
}

impl Frame {
    fn new(kind: NodeKind, first_token: usize) -> Self {
        Self {
            kind,
            first_token,
            name_token: None,
            children: Vec::new(),
        }
    }
}

struct TreeBuilder<'a> {
    tokens: &'a [Token],
    pos: usize,
    stack: Vec<Frame>,
    sink: DiagnosticSink,
}

impl<'a> TreeBuilder<'a> {
    fn run(&mut self, cancel: &CancellationToken) -> Result<(), Stop> {
        while self.pos < self.tokens.len() {
            let token = self.tokens[self.pos];
            if token.kind.is_trivia() {
                self.pos += 1;
                continue;
            }
            match token.kind {
                TokenKind::TypeKw | TokenKind::InterfaceKw => {
                    self.begin_decl(NodeKind::TypeDecl, cancel)?;
                }
                TokenKind::FnKw => {
                    self.begin_decl(NodeKind::MemberDecl, cancel)?;
                }
                TokenKind::LBrace => {
                    self.begin_block(cancel)?;
                }
                TokenKind::RBrace => {
                    self.close_block()?;
                }
                TokenKind::Semicolon => {
                    let semi = self.pos;
                    self.pos += 1;
                    // `;` ends a bodyless declaration header.
                    if self.top_is_declaration() {
                        self.finish_frame(semi);
                    }
                }
                TokenKind::Error => {
                    self.diag("unexpected character", token.range())?;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    fn begin_decl(&mut self, kind: NodeKind, cancel: &CancellationToken) -> Result<(), Stop> {
        self.check_cancelled(cancel)?;

        // A declaration keyword terminates any open header that never got
        // a body.
        if self.top_is_declaration() {
            let end = self.prev_significant(self.pos);
            self.finish_frame(end);
        }

        let keyword = self.pos;
        self.pos += 1;

        let mut frame = Frame::new(kind, keyword);
        match self.peek_significant() {
            Some((index, TokenKind::Ident)) => {
                frame.name_token = Some(index);
                self.pos = index + 1;
            }
            _ => {
                self.diag(
                    "expected name after declaration keyword",
                    self.tokens[keyword].range(),
                )?;
            }
        }
        self.stack.push(frame);
        Ok(())
    }

    fn begin_block(&mut self, cancel: &CancellationToken) -> Result<(), Stop> {
        self.check_cancelled(cancel)?;
        self.stack.push(Frame::new(NodeKind::Block, self.pos));
        self.pos += 1;
        Ok(())
    }

    fn close_block(&mut self) -> Result<(), Stop> {
        let brace = self.pos;

        // Close any bodyless declaration headers sitting above the block.
        while self.top_is_declaration() {
            let end = self.prev_significant(brace);
            self.finish_frame(end);
        }

        if self.top_kind() == Some(NodeKind::Block) {
            self.pos += 1;
            self.finish_frame(brace);
            // The block just closed was a declaration body: the declaration
            // ends with it.
            if self.top_is_declaration() {
                self.finish_frame(brace);
            }
        } else {
            self.diag("unmatched '}'", self.tokens[brace].range())?;
            self.pos += 1;
        }
        Ok(())
    }

    /// Close all remaining frames and produce the root.
    fn finish(mut self) -> (StructuralNode, Vec<Diagnostic>, bool) {
        let last = self.tokens.len().saturating_sub(1);
        while self.stack.len() > 1 {
            if self.top_kind() == Some(NodeKind::Block) {
                if let Some(frame) = self.stack.last() {
                    // The sink silently refuses past the cap.
                    let range = self.tokens[frame.first_token].range();
                    self.sink.push(Diagnostic::new("unclosed block", range));
                }
            }
            self.finish_frame(last);
        }

        let root_frame = match self.stack.pop() {
            Some(frame) => frame,
            None => Frame::new(NodeKind::SourceFile, 0),
        };
        let root = StructuralNode {
            kind: NodeKind::SourceFile,
            children: root_frame.children,
            first_token: 0,
            last_token: last,
            name_token: None,
        };
        let (diagnostics, overflowed) = self.sink.into_parts();
        (root, diagnostics, overflowed)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn check_cancelled(&self, cancel: &CancellationToken) -> Result<(), Stop> {
        if cancel.is_cancelled() {
            Err(Stop::Cancelled)
        } else {
            Ok(())
        }
    }

    fn diag(&mut self, message: &str, range: TextRange) -> Result<(), Stop> {
        if self.sink.push(Diagnostic::new(message, range)) {
            Ok(())
        } else {
            Err(Stop::Overflow)
        }
    }

    /// Pop the top frame into its parent, ending at `last_token`.
    fn finish_frame(&mut self, last_token: usize) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let node = StructuralNode {
            kind: frame.kind,
            children: frame.children,
            first_token: frame.first_token,
            last_token,
            name_token: frame.name_token,
        };
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
        }
    }

    fn top_kind(&self) -> Option<NodeKind> {
        self.stack.last().map(|f| f.kind)
    }

    fn top_is_declaration(&self) -> bool {
        self.top_kind().is_some_and(NodeKind::is_declaration)
    }

    /// Next non-trivia token at or after the cursor.
    fn peek_significant(&self) -> Option<(usize, TokenKind)> {
        self.tokens[self.pos..]
            .iter()
            .position(|t| !t.kind.is_trivia())
            .map(|i| (self.pos + i, self.tokens[self.pos + i].kind))
    }

    /// Index of the last non-trivia token before `before` (0 if none).
    fn prev_significant(&self, before: usize) -> usize {
        self.tokens[..before]
            .iter()
            .rposition(|t| !t.kind.is_trivia())
            .unwrap_or(0)
    }
}
