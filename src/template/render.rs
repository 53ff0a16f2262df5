//! Template evaluation.
//!
//! Nodes are evaluated in document order. Blocks are evaluated post-order:
//! the body is rendered to completion into its own buffer, then the block's
//! chain runs on the result. Binding and assignment nodes write to the one
//! script scope, wherever they are nested.

use super::ast::{Expr, Node, NodeId, PathStep, Template};
use super::scope::Scope;
use crate::error::{Result, SiestaError};
use crate::filters::{self, Chain};
use crate::runtime::Runtime;
use crate::value::{Value, ValueData};
use serde_json::Value as Json;

pub struct Renderer<'t, 'r> {
    template: &'t Template,
    scope: Scope,
    rt: &'r mut Runtime,
}

impl<'t, 'r> Renderer<'t, 'r> {
    pub fn new(template: &'t Template, scope: Scope, rt: &'r mut Runtime) -> Self {
        Self {
            template,
            scope,
            rt,
        }
    }

    /// Render the whole template. Output is returned only if every node
    /// succeeds.
    pub fn render(&mut self) -> Result<String> {
        let template = self.template;
        let mut out = String::new();
        self.render_body(template.root(), &mut out)?;
        Ok(out)
    }

    #[cfg(test)]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    fn render_body(&mut self, ids: &[NodeId], out: &mut String) -> Result<()> {
        ids.iter().try_for_each(|&id| self.render_node(id, out))
    }

    fn render_node(&mut self, id: NodeId, out: &mut String) -> Result<()> {
        let template = self.template;
        match template.node(id) {
            Node::Literal(text) => out.push_str(text),
            Node::Output { expr, chain, line } => {
                tracing::trace!(line, expr = %expr, "output");
                let value = self.eval(expr, *line)?;
                let value = self.apply(value, chain)?;
                out.push_str(&value.render());
            }
            Node::Assign {
                name,
                expr,
                chain,
                line,
            } => {
                tracing::trace!(line, name = %name, "assign");
                let value = self.eval(expr, *line)?;
                let value = self.apply(value, chain)?;
                self.scope.bind(name.clone(), value);
            }
            Node::Binding {
                name,
                chain,
                body,
                line,
            } => {
                tracing::debug!(line, name = %name, "binding block");
                let value = self.render_block(body, chain)?;
                self.scope.bind(name.clone(), value);
            }
            Node::FilterBlock { chain, body, line } => {
                tracing::debug!(line, "filter block");
                let value = self.render_block(body, chain)?;
                out.push_str(&value.render());
            }
        }
        Ok(())
    }

    fn render_block(&mut self, body: &[NodeId], chain: &Chain) -> Result<Value> {
        let mut text = String::new();
        self.render_body(body, &mut text)?;
        self.apply(Value::text(text), chain)
    }

    fn apply(&mut self, value: Value, chain: &Chain) -> Result<Value> {
        if chain.is_empty() {
            return Ok(value);
        }
        filters::apply(value, chain, self.rt)
    }

    fn eval(&self, expr: &Expr, line: usize) -> Result<Value> {
        let (root, steps) = match expr {
            Expr::Literal(text) => return Ok(Value::text(text.clone())),
            Expr::Path { root, steps } => (root, steps),
        };
        let undefined = || SiestaError::UndefinedVariable {
            name: expr.to_string(),
            line,
        };

        let value = self.scope.get(root).ok_or_else(undefined)?;
        if steps.is_empty() {
            return Ok(value.clone());
        }

        let ValueData::Data(json) = &value.data else {
            return Err(undefined());
        };
        steps
            .iter()
            .try_fold(json, |current, step| lookup(current, step))
            .map(|found| Value::data(found.clone()))
            .ok_or_else(undefined)
    }
}

fn lookup<'a>(json: &'a Json, step: &PathStep) -> Option<&'a Json> {
    match (json, step) {
        (Json::Object(map), PathStep::Key(key)) => map.get(key),
        (Json::Object(map), PathStep::Index(index)) => map.get(&index.to_string()),
        (Json::Array(items), PathStep::Index(index)) => items.get(*index),
        _ => None,
    }
}

/// Render `template` against `scope` with the given runtime.
pub fn render(template: &Template, scope: Scope, rt: &mut Runtime) -> Result<String> {
    Renderer::new(template, scope, rt).render()
}
