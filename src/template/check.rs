//! Static binding check.
//!
//! Walks the template in document order and rejects any variable reference
//! that no earlier binding, assignment or seeded variable defines. A binding
//! block's name becomes visible after its `endset`, so a body cannot read the
//! variable it is defining.

use super::ast::{Expr, Node, NodeId, Template};
use crate::error::{Result, SiestaError};
use std::collections::HashSet;

pub fn check_bindings<'a>(template: &Template, seeded: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut visible: HashSet<String> = seeded.into_iter().map(str::to_string).collect();
    walk(template, template.root(), &mut visible)
}

fn walk(template: &Template, ids: &[NodeId], visible: &mut HashSet<String>) -> Result<()> {
    for &id in ids {
        match template.node(id) {
            Node::Literal(_) => {}
            Node::Output { expr, line, .. } => require(expr, *line, visible)?,
            Node::Assign { name, expr, line, .. } => {
                require(expr, *line, visible)?;
                visible.insert(name.clone());
            }
            Node::Binding { name, body, .. } => {
                walk(template, body, visible)?;
                visible.insert(name.clone());
            }
            Node::FilterBlock { body, .. } => walk(template, body, visible)?,
        }
    }
    Ok(())
}

fn require(expr: &Expr, line: usize, visible: &HashSet<String>) -> Result<()> {
    match expr.root() {
        Some(root) if !visible.contains(root) => Err(SiestaError::UndefinedVariable {
            name: root.to_string(),
            line,
        }),
        _ => Ok(()),
    }
}
