//! Script templates.
//!
//! # Syntax
//!
//! - `{{ expr|chain }}` - emit a variable, path or string literal, optionally
//!   piped through filters
//! - `{% set name|chain %}…{% endset %}` - render the body, pipe it, bind it
//! - `{% set name = expr|chain %}` - bind an expression
//! - `{% filter chain %}…{% endfilter %}` - render the body, pipe it, emit it
//! - `{# … #}` - comment
//!
//! A `-` inside a delimiter (`{%-`, `-}}`) trims whitespace on that side.
//!
//! Processing happens in three passes: [`parse`] builds an immutable node
//! arena and resolves every filter, [`check_bindings`] rejects references to
//! variables that are not yet bound, and [`render`] evaluates the nodes.

mod ast;
mod check;
mod expr;
mod lexer;
mod parser;
mod render;
mod scope;

pub use check::check_bindings;
pub use parser::parse;
pub use render::render;
pub use scope::{SEEDED, Scope};
