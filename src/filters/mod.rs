//! Filter registry.
//!
//! The built-in filters form a closed set of tagged variants. Names are
//! resolved once, when the template is parsed, so a typo in a chain is
//! reported before any command runs or any prompt is sent.
//!
//! Every filter declares a [`Contract`]:
//!
//! - **Side effect**: pure, interactive, external, both, or terminating
//! - **Input**: the value kinds it accepts
//! - **Parameters**: what may appear in `name(...)`
//! - **Label rule**: whether the incoming label survives

pub mod args;
mod files;
mod llm;
pub mod pipeline;
mod shell;
mod text;

pub use args::{ArgValue, FilterArgs, Param, ParamType, RawArgs};
pub use pipeline::apply;

use crate::error::{Result, SiestaError};
use crate::runtime::Runtime;
use crate::value::Value;
use std::fmt;

/// What a filter does to the world outside the value it transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Deterministic, no I/O.
    Pure,
    /// Waits on the user.
    Interactive,
    /// Runs commands, calls the network, or touches files.
    External,
    /// Waits on the user and then acts on the outside world.
    InteractiveExternal,
    /// Stops the run.
    Terminating,
}

/// Value kinds a filter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Anything with a plain-text form (see [`Value::is_textual`]).
    Text,
    Any,
}

/// What happens to the incoming label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRule {
    /// The output carries the incoming label unchanged.
    Preserve,
    /// The output label is whatever the filter set, replacing the incoming one.
    Replace,
    /// The output has no label.
    Strip,
}

/// Static description of a filter.
#[derive(Debug)]
pub struct Contract {
    pub name: &'static str,
    pub side_effect: SideEffect,
    pub input: InputKind,
    pub params: &'static [Param],
    pub label: LabelRule,
}

/// The built-in filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Prompt,
    Run,
    Catfiles,
    Askrun,
    Askedit,
    Code,
    Quote,
    Json,
    Debug,
    Read,
    Write,
    Append,
    Print,
}

const PATH_PARAM: &[Param] = &[Param::required("path", ParamType::Str)];

const CONTRACTS: &[(FilterKind, Contract)] = &[
    (
        FilterKind::Prompt,
        Contract {
            name: "prompt",
            side_effect: SideEffect::External,
            input: InputKind::Text,
            params: &[
                Param::required("model", ParamType::Str),
                Param::optional("temperature", ParamType::Number),
                Param::optional("max_tokens", ParamType::Count),
            ],
            label: LabelRule::Strip,
        },
    ),
    (
        FilterKind::Run,
        Contract {
            name: "run",
            side_effect: SideEffect::External,
            input: InputKind::Text,
            params: &[
                Param::optional("label", ParamType::Bool),
                Param::optional("cmd", ParamType::Str),
                Param::optional("silentfail", ParamType::Bool),
            ],
            label: LabelRule::Replace,
        },
    ),
    (
        FilterKind::Catfiles,
        Contract {
            name: "catfiles",
            side_effect: SideEffect::External,
            input: InputKind::Text,
            params: &[],
            label: LabelRule::Strip,
        },
    ),
    (
        FilterKind::Askrun,
        Contract {
            name: "askrun",
            side_effect: SideEffect::InteractiveExternal,
            input: InputKind::Text,
            params: &[Param::optional("cmd", ParamType::Str)],
            label: LabelRule::Strip,
        },
    ),
    (
        FilterKind::Askedit,
        Contract {
            name: "askedit",
            side_effect: SideEffect::Interactive,
            input: InputKind::Text,
            params: &[],
            label: LabelRule::Strip,
        },
    ),
    (
        FilterKind::Code,
        Contract {
            name: "code",
            side_effect: SideEffect::Pure,
            input: InputKind::Text,
            params: &[],
            label: LabelRule::Strip,
        },
    ),
    (
        FilterKind::Quote,
        Contract {
            name: "quote",
            side_effect: SideEffect::Pure,
            input: InputKind::Text,
            params: &[],
            label: LabelRule::Strip,
        },
    ),
    (
        FilterKind::Json,
        Contract {
            name: "json",
            side_effect: SideEffect::Pure,
            input: InputKind::Text,
            params: &[],
            label: LabelRule::Strip,
        },
    ),
    (
        FilterKind::Debug,
        Contract {
            name: "debug",
            side_effect: SideEffect::Terminating,
            input: InputKind::Any,
            params: &[],
            label: LabelRule::Preserve,
        },
    ),
    (
        FilterKind::Read,
        Contract {
            name: "read",
            side_effect: SideEffect::External,
            input: InputKind::Text,
            params: &[],
            label: LabelRule::Replace,
        },
    ),
    (
        FilterKind::Write,
        Contract {
            name: "write",
            side_effect: SideEffect::External,
            input: InputKind::Any,
            params: PATH_PARAM,
            label: LabelRule::Strip,
        },
    ),
    (
        FilterKind::Append,
        Contract {
            name: "append",
            side_effect: SideEffect::External,
            input: InputKind::Any,
            params: PATH_PARAM,
            label: LabelRule::Strip,
        },
    ),
    (
        FilterKind::Print,
        Contract {
            name: "print",
            side_effect: SideEffect::Interactive,
            input: InputKind::Any,
            params: &[],
            label: LabelRule::Preserve,
        },
    ),
];

impl FilterKind {
    /// All registered filters, in registry order.
    #[cfg(test)]
    pub fn all() -> impl Iterator<Item = FilterKind> {
        CONTRACTS.iter().map(|(kind, _)| *kind)
    }

    /// Look up a filter by name.
    pub fn resolve(name: &str, line: usize) -> Result<FilterKind> {
        CONTRACTS
            .iter()
            .find(|(_, contract)| contract.name == name)
            .map(|(kind, _)| *kind)
            .ok_or_else(|| SiestaError::UnknownFilter {
                name: name.to_string(),
                line,
            })
    }

    pub fn contract(self) -> &'static Contract {
        CONTRACTS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, contract)| contract)
            .unwrap_or_else(|| unreachable!("every FilterKind has a contract entry"))
    }

    pub fn name(self) -> &'static str {
        self.contract().name
    }

    /// Run the filter. Input kind and label handling are the pipeline's job.
    fn invoke(self, input: Value, args: &FilterArgs, rt: &mut Runtime) -> Result<Value> {
        match self {
            FilterKind::Prompt => llm::prompt(input, args, rt),
            FilterKind::Run => shell::run(input, args, rt),
            FilterKind::Catfiles => files::catfiles(input, rt),
            FilterKind::Askrun => shell::askrun(input, args, rt),
            FilterKind::Askedit => text::askedit(input, rt),
            FilterKind::Code => Ok(text::code(input)),
            FilterKind::Quote => Ok(text::quote(input)),
            FilterKind::Json => text::json(input),
            FilterKind::Debug => Err(text::debug(input)),
            FilterKind::Read => files::read(input, rt),
            FilterKind::Write => files::write(input, args, rt),
            FilterKind::Append => files::append(input, args, rt),
            FilterKind::Print => text::print(input, rt),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One resolved step of a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCall {
    pub kind: FilterKind,
    pub args: FilterArgs,
    pub line: usize,
}

impl FilterCall {
    /// Resolve `name` and bind its arguments.
    pub fn resolve(name: &str, raw: RawArgs, line: usize) -> Result<Self> {
        let kind = FilterKind::resolve(name, line)?;
        let args = FilterArgs::bind(name, kind.contract().params, raw, line)?;
        Ok(Self { kind, args, line })
    }
}

/// An ordered sequence of filter calls, applied left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    pub calls: Vec<FilterCall>,
}

impl Chain {
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The first `n` calls as a chain of their own.
    #[cfg(test)]
    pub fn prefix(&self, n: usize) -> Chain {
        Chain {
            calls: self.calls[..n.min(self.calls.len())].to_vec(),
        }
    }

    /// The calls from `n` onward as a chain of their own.
    #[cfg(test)]
    pub fn suffix(&self, n: usize) -> Chain {
        Chain {
            calls: self.calls[n.min(self.calls.len())..].to_vec(),
        }
    }
}
