//! Rule-driven form validation
//!
//! Forms are JSON objects. Each field carries an ordered list of rules;
//! validation runs every field and accumulates messages keyed by field name.
//! A field that is empty and not required skips its remaining rules.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Field name → messages, keyed in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Iterate `(field, message)` pairs, one per message.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| (field.as_str(), m.as_str())))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Cross-field check: receives the field value and the whole form.
pub type CustomCheck = Arc<dyn Fn(&Value, &Map<String, Value>) -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern(Regex, String),
    Min(f64),
    Max(f64),
    OneOf(Vec<String>),
    Custom(CustomCheck),
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "Required"),
            Self::MinLength(n) => write!(f, "MinLength({})", n),
            Self::MaxLength(n) => write!(f, "MaxLength({})", n),
            Self::Pattern(re, _) => write!(f, "Pattern({})", re.as_str()),
            Self::Min(n) => write!(f, "Min({})", n),
            Self::Max(n) => write!(f, "Max({})", n),
            Self::OneOf(values) => write!(f, "OneOf({:?})", values),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Rules for one form field.
#[derive(Debug, Clone)]
pub struct FieldRules {
    pub field: String,
    pub label: String,
    pub rules: Vec<Rule>,
}

impl FieldRules {
    pub fn new(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            rules: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.rules.push(Rule::Required);
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.rules.push(Rule::MinLength(n));
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.rules.push(Rule::MaxLength(n));
        self
    }

    pub fn pattern(mut self, regex: &Regex, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Pattern(regex.clone(), message.into()));
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        self.rules.push(Rule::Min(n));
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        self.rules.push(Rule::Max(n));
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules
            .push(Rule::OneOf(values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value, &Map<String, Value>) -> Option<String> + Send + Sync + 'static,
    {
        self.rules.push(Rule::Custom(Arc::new(check)));
        self
    }

    fn is_required(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Required))
    }

    fn check(&self, value: &Value, form: &Map<String, Value>) -> Vec<String> {
        if is_empty(value) {
            return if self.is_required() {
                vec![format!("{} is required", self.label)]
            } else {
                Vec::new()
            };
        }

        let mut messages = Vec::new();
        for rule in &self.rules {
            let failure = match rule {
                Rule::Required => None,
                Rule::MinLength(n) => length(value)
                    .filter(|len| len < n)
                    .map(|_| format!("{} must be at least {} characters", self.label, n)),
                Rule::MaxLength(n) => length(value)
                    .filter(|len| len > n)
                    .map(|_| format!("{} must be at most {} characters", self.label, n)),
                Rule::Pattern(re, message) => match as_text(value) {
                    Some(text) if !re.is_match(&text) => Some(message.clone()),
                    _ => None,
                },
                Rule::Min(min) => match as_number(value) {
                    Some(n) if n < *min => Some(format!("{} must be at least {}", self.label, min)),
                    None => Some(format!("{} must be a number", self.label)),
                    _ => None,
                },
                Rule::Max(max) => match as_number(value) {
                    Some(n) if n > *max => Some(format!("{} must be at most {}", self.label, max)),
                    None => Some(format!("{} must be a number", self.label)),
                    _ => None,
                },
                Rule::OneOf(allowed) => match as_text(value) {
                    Some(text) if allowed.iter().any(|a| *a == text) => None,
                    _ => Some(format!("{} must be one of {}", self.label, allowed.join(", "))),
                },
                Rule::Custom(check) => check(value, form),
            };
            if let Some(message) = failure {
                messages.push(message);
            }
        }
        messages
    }
}

/// An ordered collection of field rules forming one form.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<FieldRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rules: FieldRules) -> Self {
        self.fields.push(rules);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldRules> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a form. Non-object input is treated as an empty form.
    pub fn validate(&self, data: &Value) -> Result<(), ValidationErrors> {
        let empty = Map::new();
        let form = data.as_object().unwrap_or(&empty);
        let mut errors = ValidationErrors::default();

        for field in &self.fields {
            let value = form.get(&field.field).unwrap_or(&Value::Null);
            for message in field.check(value, form) {
                errors.add(field.field.clone(), message);
            }
        }

        errors.into_result()
    }
}

/// Missing, null, blank strings and empty arrays are all "unset".
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.trim().chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Integral floats render without a fraction so `18.0` matches "18".
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some((f as i64).to_string())
            }
            _ => Some(n.to_string()),
        },
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers may arrive as JSON numbers or numeric strings from form inputs.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
