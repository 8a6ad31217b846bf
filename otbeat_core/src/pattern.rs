//! Declarative, ordered-field text extraction.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s. Compiling it concatenates
//! every field's pattern, in declaration order and with no implicit separators,
//! into one regular expression anchored at the start of the input. Named fields
//! become capture groups; anonymous fields are matched and then discarded.
//!
//! The compiled [`Extractor`] is immutable and can be shared across threads.

use std::collections::HashSet;

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

/// Error raised while compiling a [`Schema`].
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("schema has no fields")]
    EmptySchema,

    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    #[error("invalid field name {0:?}: expected a letter or '_' followed by letters, digits or '_'")]
    InvalidFieldName(String),

    /// A single field's pattern does not parse on its own.
    #[error("invalid pattern for field #{position}: {message}")]
    InvalidPattern { position: usize, message: String },

    /// The concatenated expression was rejected (size limits and the like).
    #[error("invalid schema expression: {0}")]
    Regex(#[from] regex::Error),
}

/// One grammar element: a named capture or an anonymous separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name. `None` marks an anonymous separator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Regular expression for this element.
    pub pattern: String,
}

impl FieldSpec {
    pub fn named(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            pattern: pattern.into(),
        }
    }

    pub fn anonymous(pattern: impl Into<String>) -> Self {
        Self {
            name: None,
            pattern: pattern.into(),
        }
    }

    /// Anonymous separator that matches `text` verbatim.
    #[must_use]
    pub fn literal(text: &str) -> Self {
        Self::anonymous(regex::escape(text))
    }

    #[must_use]
    pub const fn is_named(&self) -> bool {
        self.name.is_some()
    }
}

/// Ordered list of field specifications.
///
/// Serializes as a plain JSON array of `{"name": .., "pattern": ..}` objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a named field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.fields.push(FieldSpec::named(name, pattern));
        self
    }

    /// Append an anonymous separator given as a regular expression.
    #[must_use]
    pub fn separator(mut self, pattern: impl Into<String>) -> Self {
        self.fields.push(FieldSpec::anonymous(pattern));
        self
    }

    /// Append an anonymous separator matched verbatim.
    #[must_use]
    pub fn literal(mut self, text: &str) -> Self {
        self.fields.push(FieldSpec::literal(text));
        self
    }

    pub fn push(&mut self, spec: FieldSpec) {
        self.fields.push(spec);
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Parse a schema from a JSON array of field specs.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Compile the schema into a reusable [`Extractor`].
    ///
    /// # Errors
    /// Returns [`CompileError`] when the schema is empty, when a field name is
    /// repeated or is not a valid group name, or when a pattern does not parse.
    pub fn compile(&self) -> Result<Extractor, CompileError> {
        if self.fields.is_empty() {
            return Err(CompileError::EmptySchema);
        }

        let mut seen = HashSet::new();
        for name in self.fields.iter().filter_map(|f| f.name.as_deref()) {
            if !is_valid_field_name(name) {
                return Err(CompileError::InvalidFieldName(name.to_string()));
            }
            if !seen.insert(name) {
                return Err(CompileError::DuplicateField(name.to_string()));
            }
        }

        let mut source = String::from(r"\A");
        let mut names = Vec::with_capacity(seen.len());
        for (position, spec) in self.fields.iter().enumerate() {
            Regex::new(&spec.pattern).map_err(|e| CompileError::InvalidPattern {
                position,
                message: e.to_string(),
            })?;

            let group = match &spec.name {
                Some(name) => {
                    names.push(name.clone());
                    format!("(?P<{name}>{})", spec.pattern)
                }
                None => format!("(?:{})", spec.pattern),
            };
            source.push_str(&group);
        }

        let regex = Regex::new(&source)?;
        debug!(
            fields = self.fields.len(),
            captures = names.len(),
            "compiled extraction schema"
        );

        Ok(Extractor { regex, names })
    }
}

impl From<Vec<FieldSpec>> for Schema {
    fn from(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }
}

impl FromIterator<FieldSpec> for Schema {
    fn from_iter<I: IntoIterator<Item = FieldSpec>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Named fields captured by one successful match, in declaration order.
///
/// Values are the raw matched substrings; no type conversion is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl IntoIterator for Record {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outcome of applying an [`Extractor`] to one input.
///
/// `NotMatched` is an ordinary result: callers skip the input and move on.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Matched(Record),
    NotMatched,
}

impl MatchResult {
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    #[must_use]
    pub const fn record(&self) -> Option<&Record> {
        match self {
            Self::Matched(record) => Some(record),
            Self::NotMatched => None,
        }
    }

    #[must_use]
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Matched(record) => Some(record),
            Self::NotMatched => None,
        }
    }
}

/// Compiled form of a [`Schema`].
#[derive(Debug, Clone)]
pub struct Extractor {
    regex: Regex,
    names: Vec<String>,
}

impl Extractor {
    /// Match `input` from its first character.
    ///
    /// Every field must match in order; whatever follows the last field is
    /// ignored.
    pub fn extract(&self, input: &str) -> MatchResult {
        let Some(captures) = self.regex.captures(input) else {
            return MatchResult::NotMatched;
        };

        let fields = self
            .names
            .iter()
            .map(|name| {
                let value = captures.name(name).map_or("", |m| m.as_str());
                (name.clone(), value.to_string())
            })
            .collect();

        MatchResult::Matched(Record { fields })
    }

    /// Names of the captured fields, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// The concatenated regular expression.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
