//! Values threaded through filter chains.
//!
//! A [`Value`] is a small wrapper: the payload plus an optional provenance
//! label. Filters never mutate a label in place; each one either keeps the
//! incoming label, replaces it, or strips it (see `filters::LabelRule`).

use serde_json::Value as Json;
use std::fmt;

/// One labelled piece of text inside a [`ValueData::Sections`] value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub label: String,
    pub text: String,
}

impl Section {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Render the section under its heading.
    pub fn render(&self) -> String {
        let mut out = format!("=== {} ===\n{}", self.label, self.text);
        if !self.text.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("======\n");
        out
    }
}

/// Payload of a [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValueData {
    Text(String),
    Data(Json),
    Sections(Vec<Section>),
}

/// A value with optional provenance label.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: ValueData,
    pub label: Option<String>,
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            data: ValueData::Text(text.into()),
            label: None,
        }
    }

    pub fn data(json: Json) -> Self {
        Self {
            data: ValueData::Data(json),
            label: None,
        }
    }

    pub fn sections(sections: Vec<Section>) -> Self {
        Self {
            data: ValueData::Sections(sections),
            label: None,
        }
    }

    /// Replace the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Short name of the payload kind, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match &self.data {
            ValueData::Text(_) => "text",
            ValueData::Sections(_) => "sections",
            ValueData::Data(Json::Null) => "null",
            ValueData::Data(Json::Array(_)) => "a JSON array",
            ValueData::Data(Json::Object(_)) => "a JSON object",
            ValueData::Data(_) => "a JSON scalar",
        }
    }

    /// Whether the value has an unambiguous plain-text form.
    ///
    /// Text, sections, and JSON strings/numbers/booleans qualify. Null, arrays
    /// and objects do not: feeding those to a text filter is a script error.
    pub fn is_textual(&self) -> bool {
        match &self.data {
            ValueData::Text(_) | ValueData::Sections(_) => true,
            ValueData::Data(json) => matches!(json, Json::String(_) | Json::Number(_) | Json::Bool(_)),
        }
    }

    /// The raw text of the payload, ignoring the label.
    ///
    /// This is what text-consuming filters operate on.
    pub fn as_text(&self) -> String {
        match &self.data {
            ValueData::Text(text) => text.clone(),
            ValueData::Sections(sections) => sections.iter().map(Section::render).collect(),
            ValueData::Data(json) => json_to_text(json),
        }
    }

    /// The text emitted into the rendered output stream.
    ///
    /// A labelled text value is rendered as a section under its label.
    pub fn render(&self) -> String {
        match (&self.data, &self.label) {
            (ValueData::Text(text), Some(label)) => Section::new(label.clone(), text.clone()).render(),
            _ => self.as_text(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn json_to_text(json: &Json) -> String {
    match json {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}
