use std::fmt;

use crate::token::{BlockKind, Span, TokenKind, Tokenizer};

/// Deepest block nesting a template may use.
pub const MAX_NESTING: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    NestingTooDeep { limit: usize, span: Span },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::NestingTooDeep { limit, span } => {
                write!(f, "blocks nested deeper than {limit} at {span}")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Dotted lookup path, e.g. `raw.dimensions.0.text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    pub fn parse(text: &str) -> Self {
        Self {
            segments: text.split('.').map(|s| s.trim().to_string()).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn head(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or("")
    }

    pub fn tail(&self) -> &[String] {
        self.segments.get(1..).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Source text copied through verbatim.
    Text(Span),
    Var(Path),
    Block {
        kind: BlockKind,
        path: Path,
        body: Vec<Node>,
    },
}

struct OpenBlock {
    kind: BlockKind,
    path: Path,
    tag: Span,
    body: Vec<Node>,
}

impl OpenBlock {
    /// An unclosed block degrades to its opening tag followed by its body.
    fn into_literal(self, parent: &mut Vec<Node>) {
        parent.push(Node::Text(self.tag));
        parent.extend(self.body);
    }
}

/// Builds the node tree for `source`.
///
/// A closing tag pairs with the nearest open block of the same kind; blocks
/// opened in between and never closed become literal text, as do stray
/// closing tags.
pub fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    let mut root = Vec::new();
    let mut stack: Vec<OpenBlock> = Vec::new();

    for token in Tokenizer::new(source) {
        match token.kind {
            TokenKind::Text | TokenKind::Literal => {
                current(&mut root, &mut stack).push(Node::Text(token.span))
            }
            TokenKind::Var(path) => {
                current(&mut root, &mut stack).push(Node::Var(Path::parse(&path)))
            }
            TokenKind::Open(kind, path) => {
                if stack.len() >= MAX_NESTING {
                    return Err(TemplateError::NestingTooDeep {
                        limit: MAX_NESTING,
                        span: token.span,
                    });
                }
                stack.push(OpenBlock {
                    kind,
                    path: Path::parse(&path),
                    tag: token.span,
                    body: Vec::new(),
                });
            }
            TokenKind::Close(kind) => {
                let Some(target) = stack.iter().rposition(|b| b.kind == kind) else {
                    current(&mut root, &mut stack).push(Node::Text(token.span));
                    continue;
                };
                while stack.len() > target + 1 {
                    if let Some(orphan) = stack.pop() {
                        orphan.into_literal(current(&mut root, &mut stack));
                    }
                }
                if let Some(block) = stack.pop() {
                    current(&mut root, &mut stack).push(Node::Block {
                        kind: block.kind,
                        path: block.path,
                        body: block.body,
                    });
                }
            }
        }
    }

    while let Some(orphan) = stack.pop() {
        orphan.into_literal(current(&mut root, &mut stack));
    }
    Ok(root)
}

fn current<'a>(root: &'a mut Vec<Node>, stack: &'a mut [OpenBlock]) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(block) => &mut block.body,
        None => root,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{MAX_NESTING, Node, Path, TemplateError, parse};
    use crate::token::{BlockKind, Span};

    #[test]
    fn nests_blocks() {
        let nodes = parse("{{#each xs}}{{#if a}}{{b}}{{/if}}{{/each}}").unwrap();
        assert_eq!(
            nodes,
            vec![Node::Block {
                kind: BlockKind::Each,
                path: Path::parse("xs"),
                body: vec![Node::Block {
                    kind: BlockKind::If,
                    path: Path::parse("a"),
                    body: vec![Node::Var(Path::parse("b"))],
                }],
            }]
        );
    }

    #[test]
    fn stray_close_is_text() {
        assert_eq!(
            parse("x{{/if}}").unwrap(),
            vec![Node::Text(Span::new(0, 1)), Node::Text(Span::new(1, 8))]
        );
    }

    #[test]
    fn unclosed_inner_block_flattens_into_parent() {
        let nodes = parse("{{#if a}}{{#each xs}}y{{/if}}").unwrap();
        assert_eq!(
            nodes,
            vec![Node::Block {
                kind: BlockKind::If,
                path: Path::parse("a"),
                body: vec![Node::Text(Span::new(9, 21)), Node::Text(Span::new(21, 22))],
            }]
        );
    }

    #[test]
    fn path_segments_are_trimmed() {
        let path = Path::parse("raw . dimensions.0");
        assert_eq!(path.head(), "raw");
        assert_eq!(path.tail(), &["dimensions".to_string(), "0".to_string()][..]);
    }

    #[test]
    fn rejects_excessive_nesting() {
        let source = "{{#if a}}".repeat(MAX_NESTING + 1);
        assert!(matches!(
            parse(&source),
            Err(TemplateError::NestingTooDeep { limit: MAX_NESTING, .. })
        ));
    }
}
