//! Filter arguments: literals parsed from a chain, bound against a filter's
//! declared parameters at parse time.
//!
//! Binding rules:
//! - positional arguments fill parameters in declaration order
//! - keyword arguments set parameters by name
//! - a parameter set twice, an unknown keyword, surplus positionals, a
//!   wrongly typed literal, or a missing required parameter is an error
//! - `None` leaves an optional parameter unset

use crate::error::{Result, SiestaError};
use std::collections::BTreeMap;
use std::fmt;

/// A literal argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
}

impl ArgValue {
    fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Str(_) => "string",
            ArgValue::Int(_) => "integer",
            ArgValue::Float(_) => "number",
            ArgValue::Bool(_) => "boolean",
            ArgValue::None => "None",
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Str(s) => write!(f, "{:?}", s),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Float(x) => write!(f, "{}", x),
            ArgValue::Bool(true) => f.write_str("True"),
            ArgValue::Bool(false) => f.write_str("False"),
            ArgValue::None => f.write_str("None"),
        }
    }
}

/// Type a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Str,
    Bool,
    Number,
    Count,
}

impl ParamType {
    fn accepts(self, value: &ArgValue) -> bool {
        match (self, value) {
            (ParamType::Str, ArgValue::Str(_)) | (ParamType::Bool, ArgValue::Bool(_)) => true,
            (ParamType::Number, ArgValue::Int(_) | ArgValue::Float(_)) => true,
            (ParamType::Count, ArgValue::Int(n)) => *n >= 0,
            _ => false,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ParamType::Str => "a string",
            ParamType::Bool => "a boolean",
            ParamType::Number => "a number",
            ParamType::Count => "a non-negative integer",
        }
    }
}

/// A declared filter parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
}

impl Param {
    pub const fn required(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: false,
        }
    }
}

/// Arguments exactly as written in the chain, before binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawArgs {
    pub positional: Vec<ArgValue>,
    pub keyword: Vec<(String, ArgValue)>,
}

/// Arguments bound to parameter names and type-checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterArgs {
    values: BTreeMap<&'static str, ArgValue>,
}

impl FilterArgs {
    /// Bind raw arguments against `params` for the filter `filter`.
    pub fn bind(filter: &str, params: &[Param], raw: RawArgs, line: usize) -> Result<Self> {
        let invalid = |message: String| SiestaError::InvalidArguments {
            filter: filter.to_string(),
            line,
            message,
        };

        if raw.positional.len() > params.len() {
            return Err(invalid(format!(
                "takes at most {} positional argument(s), got {}",
                params.len(),
                raw.positional.len()
            )));
        }

        let mut given: BTreeMap<&'static str, ArgValue> = BTreeMap::new();
        let named = params
            .iter()
            .zip(raw.positional)
            .map(|(param, value)| (*param, value));

        let mut keyword = Vec::with_capacity(raw.keyword.len());
        for (name, value) in raw.keyword {
            let param = params.iter().find(|p| p.name == name).ok_or_else(|| {
                invalid(format!(
                    "unknown keyword '{}'{}",
                    name,
                    expected_keywords(params)
                ))
            })?;
            keyword.push((*param, value));
        }

        for (param, value) in named.chain(keyword) {
            if given.contains_key(param.name) {
                return Err(invalid(format!("'{}' given more than once", param.name)));
            }
            if value != ArgValue::None && !param.ty.accepts(&value) {
                return Err(invalid(format!(
                    "'{}' must be {}, got {} {}",
                    param.name,
                    param.ty.name(),
                    value.type_name(),
                    value
                )));
            }
            given.insert(param.name, value);
        }

        given.retain(|_, value| *value != ArgValue::None);

        if let Some(missing) = params.iter().find(|p| p.required && !given.contains_key(p.name)) {
            return Err(invalid(format!("missing required argument '{}'", missing.name)));
        }

        Ok(Self { values: given })
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Boolean parameter, `false` when unset.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(ArgValue::Bool(true)))
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ArgValue::Int(i)) => Some(*i as f64),
            Some(ArgValue::Float(x)) => Some(*x),
            _ => None,
        }
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        match self.values.get(name) {
            Some(ArgValue::Int(n)) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn expected_keywords(params: &[Param]) -> String {
    if params.is_empty() {
        " (this filter takes no arguments)".to_string()
    } else {
        let names: Vec<_> = params.iter().map(|p| p.name).collect();
        format!(" (expected one of: {})", names.join(", "))
    }
}
