//! Builds the node arena from lexer tokens.
//!
//! Open blocks are kept on an explicit stack; a block's node is only added to
//! the arena when its end tag is reached, so every child id is allocated
//! before its parent's.

use super::ast::{Node, NodeId, Template};
use super::expr::TagParser;
use super::lexer::{Token, TokenKind, tokenize};
use crate::error::{Result, SiestaError};
use crate::filters::Chain;

/// Deepest block nesting a script may use.
pub const MAX_DEPTH: usize = 64;

enum OpenKind {
    Binding { name: String, chain: Chain },
    Filter { chain: Chain },
}

impl OpenKind {
    fn tag(&self) -> &'static str {
        match self {
            OpenKind::Binding { .. } => "set",
            OpenKind::Filter { .. } => "filter",
        }
    }

    fn end_tag(&self) -> &'static str {
        match self {
            OpenKind::Binding { .. } => "endset",
            OpenKind::Filter { .. } => "endfilter",
        }
    }
}

struct OpenBlock {
    kind: OpenKind,
    line: usize,
    body: Vec<NodeId>,
}

struct Builder {
    nodes: Vec<Node>,
    root: Vec<NodeId>,
    open: Vec<OpenBlock>,
}

impl Builder {
    fn push(&mut self, node: Node) {
        let id = self.nodes.len();
        self.nodes.push(node);
        match self.open.last_mut() {
            Some(block) => block.body.push(id),
            None => self.root.push(id),
        }
    }

    fn open(&mut self, kind: OpenKind, line: usize) -> Result<()> {
        if self.open.len() >= MAX_DEPTH {
            return Err(SiestaError::Syntax {
                line,
                message: format!("blocks nested deeper than {} levels", MAX_DEPTH),
            });
        }
        self.open.push(OpenBlock {
            kind,
            line,
            body: Vec::new(),
        });
        Ok(())
    }

    fn close(&mut self, end_tag: &str, line: usize) -> Result<()> {
        let block = self.open.pop().ok_or_else(|| SiestaError::Syntax {
            line,
            message: format!("'{}' without an open block", end_tag),
        })?;

        if block.kind.end_tag() != end_tag {
            return Err(SiestaError::Syntax {
                line,
                message: format!(
                    "expected '{}' to close '{}' from line {}, found '{}'",
                    block.kind.end_tag(),
                    block.kind.tag(),
                    block.line,
                    end_tag
                ),
            });
        }

        let node = match block.kind {
            OpenKind::Binding { name, chain } => Node::Binding {
                name,
                chain,
                body: block.body,
                line: block.line,
            },
            OpenKind::Filter { chain } => Node::FilterBlock {
                chain,
                body: block.body,
                line: block.line,
            },
        };
        self.push(node);
        Ok(())
    }

    fn statement(&mut self, source: &str, line: usize) -> Result<()> {
        let mut p = TagParser::new(source, line)?;
        let keyword = p.ident("a statement")?;

        match keyword.as_str() {
            "set" => {
                let name = p.ident("a variable name")?;
                if p.eat('=') {
                    let expr = p.expr()?;
                    let chain = p.piped_chain()?;
                    p.finish()?;
                    self.push(Node::Assign {
                        name,
                        expr,
                        chain,
                        line,
                    });
                } else {
                    let chain = p.piped_chain()?;
                    p.finish()?;
                    self.open(OpenKind::Binding { name, chain }, line)?;
                }
            }
            "filter" => {
                let chain = p.chain()?;
                p.finish()?;
                self.open(OpenKind::Filter { chain }, line)?;
            }
            "endset" | "endfilter" => {
                p.finish()?;
                self.close(&keyword, line)?;
            }
            other => {
                return Err(SiestaError::Syntax {
                    line,
                    message: format!(
                        "unsupported tag '{}' (expected set, filter, endset or endfilter)",
                        other
                    ),
                });
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Template> {
        if let Some(block) = self.open.last() {
            return Err(SiestaError::Syntax {
                line: block.line,
                message: format!(
                    "'{}' block is never closed (missing '{}')",
                    block.kind.tag(),
                    block.kind.end_tag()
                ),
            });
        }
        Ok(Template {
            nodes: self.nodes,
            root: self.root,
        })
    }
}

/// Parse script source into a [`Template`].
///
/// Filter names and arguments are resolved here, so an unknown filter or a
/// bad argument fails before anything runs.
pub fn parse(source: &str) -> Result<Template> {
    let mut builder = Builder {
        nodes: Vec::new(),
        root: Vec::new(),
        open: Vec::new(),
    };

    for Token { kind, line } in tokenize(source)? {
        match kind {
            TokenKind::Text(text) => builder.push(Node::Literal(text)),
            TokenKind::Output(source) => {
                let mut p = TagParser::new(&source, line)?;
                let expr = p.expr()?;
                let chain = p.piped_chain()?;
                p.finish()?;
                builder.push(Node::Output { expr, chain, line });
            }
            TokenKind::Statement(source) => builder.statement(&source, line)?,
        }
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterKind;
    use crate::template::ast::Expr;

    fn root_nodes(template: &Template) -> Vec<&Node> {
        template.root().iter().map(|&id| template.node(id)).collect()
    }

    #[test]
    fn test_literal_only() {
        let t = parse("just text\n").unwrap();
        assert_eq!(root_nodes(&t), vec![&Node::Literal("just text\n".into())]);
    }

    #[test]
    fn test_binding_block_with_nested_filter() {
        let t = parse(
            "{% set commit|prompt(\"model-x\") %}Msg:\n{% filter run(label=True) %}git diff{% endfilter %}{% endset %}",
        )
        .unwrap();

        assert_eq!(t.len(), 4, "children live in the arena next to their block");
        let root = root_nodes(&t);
        assert_eq!(root.len(), 1);
        let Node::Binding { name, chain, body, line } = root[0] else {
            panic!("expected binding, got {:?}", root[0]);
        };
        assert_eq!(name, "commit");
        assert_eq!(*line, 1);
        assert_eq!(chain.calls[0].kind, FilterKind::Prompt);
        assert_eq!(body.len(), 2);
        assert_eq!(t.node(body[0]), &Node::Literal("Msg:\n".into()));

        let Node::FilterBlock { chain, body, line } = t.node(body[1]) else {
            panic!("expected filter block");
        };
        assert_eq!(*line, 2);
        assert!(chain.calls[0].args.flag("label"));
        assert_eq!(t.node(body[0]), &Node::Literal("git diff".into()));
    }

    #[test]
    fn test_binding_without_chain() {
        let t = parse("{% set body %}text{% endset %}").unwrap();
        let Node::Binding { chain, .. } = t.node(t.root()[0]) else {
            panic!("expected binding");
        };
        assert!(chain.is_empty());
    }

    #[test]
    fn test_assignment_and_output() {
        let t = parse("{% set title = data.title|quote %}{{ title }}").unwrap();
        let root = root_nodes(&t);
        assert!(matches!(
            root[0],
            Node::Assign { name, chain, .. } if name == "title" && chain.calls.len() == 1
        ));
        assert!(matches!(
            root[1],
            Node::Output { expr: Expr::Path { root, .. }, .. } if root == "title"
        ));
    }

    #[test]
    fn test_unknown_filter_fails_at_parse() {
        let err = parse("line one\n{{ x|shout }}").unwrap_err();
        assert_eq!(err.to_string(), "unknown filter 'shout' on line 2");
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse("{% filter run %}\nls\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "syntax error on line 1: 'filter' block is never closed (missing 'endfilter')"
        );
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = parse("{% set a %}\n{% endfilter %}").unwrap_err();
        assert!(err.to_string().contains("expected 'endset' to close 'set' from line 1"));
    }

    #[test]
    fn test_stray_end_tag() {
        let err = parse("{% endset %}").unwrap_err();
        assert!(err.to_string().contains("'endset' without an open block"));
    }

    #[test]
    fn test_unsupported_tag() {
        let err = parse("{% if x %}{% endif %}").unwrap_err();
        assert!(err.to_string().contains("unsupported tag 'if'"));
    }

    #[test]
    fn test_nesting_limit() {
        let deep_ok = "{% filter quote %}".repeat(MAX_DEPTH) + &"{% endfilter %}".repeat(MAX_DEPTH);
        assert!(parse(&deep_ok).is_ok());

        let too_deep =
            "{% filter quote %}".repeat(MAX_DEPTH + 1) + &"{% endfilter %}".repeat(MAX_DEPTH + 1);
        let err = parse(&too_deep).unwrap_err();
        assert!(err.to_string().contains("nested deeper than 64 levels"));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse("{% endset extra %}").unwrap_err();
        assert!(err.to_string().contains("unexpected 'extra'"));
    }
}
