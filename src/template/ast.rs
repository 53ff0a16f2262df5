use crate::filters::Chain;
use std::fmt;

/// Index of a node in [`Template::nodes`].
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    Key(String), // foo.bar, foo["bar"]
    Index(usize), // foo.0, foo[0]
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path { root: String, steps: Vec<PathStep> },
    Literal(String),
}

impl Expr {
    /// The scope variable this expression reads, if any.
    pub fn root(&self) -> Option<&str> {
        match self {
            Expr::Path { root, .. } => Some(root),
            Expr::Literal(_) => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Path { root, steps } => {
                f.write_str(root)?;
                for step in steps {
                    match step {
                        PathStep::Key(key) => write!(f, ".{}", key)?,
                        PathStep::Index(index) => write!(f, ".{}", index)?,
                    }
                }
                Ok(())
            }
            Expr::Literal(text) => write!(f, "{:?}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(String),
    /// `{{ expr|chain }}`
    Output {
        expr: Expr,
        chain: Chain,
        line: usize,
    },
    /// `{% set name = expr|chain %}`
    Assign {
        name: String,
        expr: Expr,
        chain: Chain,
        line: usize,
    },
    /// `{% set name|chain %}body{% endset %}`
    Binding {
        name: String,
        chain: Chain,
        body: Vec<NodeId>,
        line: usize,
    },
    /// `{% filter chain %}body{% endfilter %}`
    FilterBlock {
        chain: Chain,
        body: Vec<NodeId>,
        line: usize,
    },
}

/// A parsed script: an immutable node arena plus the top-level node order.
///
/// Block bodies refer to their children by [`NodeId`]; the tree is built once
/// by the parser and never changes afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: Vec<NodeId>,
}

impl Template {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Top-level nodes in document order.
    pub fn root(&self) -> &[NodeId] {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Every filter chain in the template, in document order.
    pub fn chains(&self) -> Vec<&Chain> {
        let mut chains = Vec::new();
        self.collect_chains(&self.root, &mut chains);
        chains
    }

    fn collect_chains<'a>(&'a self, ids: &[NodeId], out: &mut Vec<&'a Chain>) {
        for &id in ids {
            match self.node(id) {
                Node::Literal(_) => {}
                Node::Output { chain, .. } | Node::Assign { chain, .. } => out.push(chain),
                Node::Binding { chain, body, .. } | Node::FilterBlock { chain, body, .. } => {
                    self.collect_chains(body, out);
                    out.push(chain);
                }
            }
        }
    }
}
