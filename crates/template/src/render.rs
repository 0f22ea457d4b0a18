use std::borrow::Cow;
use std::fmt::Write;

use crate::parse::{Node, Path, TemplateError, parse};
use crate::token::BlockKind;
use crate::value::Value;

/// A parsed template, reusable across contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        let nodes = parse(&source)?;
        Ok(Self { source, nodes })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, context: &Value) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut scopes = vec![Scope::root(context)];
        render_nodes(&self.source, &self.nodes, &mut scopes, &mut out);
        out
    }
}

/// Parses and renders in one step, surfacing template errors.
pub fn try_render(source: &str, context: &Value) -> Result<String, TemplateError> {
    Ok(Template::parse(source)?.render(context))
}

/// Renders `source`, returning it unchanged if it cannot be parsed.
pub fn render(source: &str, context: &Value) -> String {
    try_render(source, context).unwrap_or_else(|_| source.to_string())
}

/// One level of the lookup chain. `#each` pushes a scope per element.
#[derive(Debug, Clone, Copy)]
struct Scope<'a> {
    data: &'a Value,
    position: Option<(usize, usize)>,
}

impl<'a> Scope<'a> {
    fn root(data: &'a Value) -> Self {
        Self {
            data,
            position: None,
        }
    }

    fn special(&self, name: &str) -> Option<Value> {
        let (index, len) = self.position?;
        match name {
            "@index" => Some(Value::Number(index as f64)),
            "@first" => Some(Value::Bool(index == 0)),
            "@last" => Some(Value::Bool(index + 1 == len)),
            _ => None,
        }
    }
}

/// Resolves a path against the scope chain.
///
/// `@` variables walk outward from the innermost scope, so a nested `#each`
/// shadows the position of its parent. Any other head is looked up in the
/// innermost scope only: inside `#each` that is the element itself.
fn lookup<'a>(scopes: &[Scope<'a>], path: &Path) -> Option<Cow<'a, Value>> {
    let head = path.head();
    let found = if head.starts_with('@') {
        scopes
            .iter()
            .rev()
            .find_map(|scope| scope.special(head))
            .map(Cow::Owned)?
    } else {
        Cow::Borrowed(scopes.last()?.data.child(head)?)
    };

    path.tail().iter().try_fold(found, |current, segment| match current {
        Cow::Borrowed(v) => v.child(segment).map(Cow::Borrowed),
        Cow::Owned(_) => None,
    })
}

fn render_nodes<'v>(source: &str, nodes: &[Node], scopes: &mut Vec<Scope<'v>>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(span) => out.push_str(span.slice(source)),
            Node::Var(path) => {
                if let Some(value) = lookup(scopes, path) {
                    let _ = write!(out, "{value}");
                }
            }
            Node::Block {
                kind: BlockKind::If,
                path,
                body,
            } => {
                if lookup(scopes, path).is_some_and(|v| v.is_truthy()) {
                    render_nodes(source, body, scopes, out);
                }
            }
            Node::Block {
                kind: BlockKind::Each,
                path,
                body,
            } => {
                let Some(Cow::Borrowed(Value::Sequence(items))) = lookup(scopes, path) else {
                    continue;
                };
                let len = items.len();
                for (index, item) in items.iter().enumerate() {
                    scopes.push(Scope {
                        data: item,
                        position: Some((index, len)),
                    });
                    render_nodes(source, body, scopes, out);
                    scopes.pop();
                }
            }
        }
    }
}
