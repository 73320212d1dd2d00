use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Data kinds a competency item can collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Select,
    Multiselect,
    File,
    Date,
    Textarea,
}

impl FieldKind {
    pub const fn label(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Select => "select",
            FieldKind::Multiselect => "multiselect",
            FieldKind::File => "file",
            FieldKind::Date => "date",
            FieldKind::Textarea => "textarea",
        }
    }

    pub const fn has_options(self) -> bool {
        matches!(self, FieldKind::Select | FieldKind::Multiselect)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a template's collected data comes from. Only `FormInput` templates carry a schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    FormInput,
    UserProfile,
    External,
}

impl DataSource {
    pub const fn label(self) -> &'static str {
        match self {
            DataSource::FormInput => "form_input",
            DataSource::UserProfile => "user_profile",
            DataSource::External => "external",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One collectible field of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind,
            required: false,
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    fn allows_option(&self, value: &str) -> bool {
        self.options.iter().any(|option| option == value)
    }
}

/// Ordered field list owned by a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema {
    fields: Vec<FieldDefinition>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First field with the given name; duplicates are rejected by the validator.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn has_file_field(&self) -> bool {
        self.fields.iter().any(|field| field.kind == FieldKind::File)
    }

    /// Names declared more than once, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut duplicates = Vec::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) && !duplicates.contains(&field.name.as_str()) {
                duplicates.push(field.name.as_str());
            }
        }
        duplicates
    }

    /// Check a submitted entry against the declared kinds, options, and required flags.
    pub fn check_entry(&self, entry: &SubmissionEntry) -> Vec<EntryIssue> {
        let mut issues = Vec::new();

        for field in &self.fields {
            match entry.value(&field.name) {
                None => {
                    let satisfied_by_attachment =
                        field.kind == FieldKind::File && entry.attachment.is_some();
                    if field.required && !satisfied_by_attachment {
                        issues.push(EntryIssue::MissingRequired {
                            field: field.name.clone(),
                        });
                    }
                }
                Some(value) => {
                    if let Some(issue) = check_value(field, value) {
                        issues.push(issue);
                    }
                }
            }
        }

        for name in entry.values.keys() {
            if self.field(name).is_none() {
                issues.push(EntryIssue::UnknownField {
                    field: name.clone(),
                });
            }
        }

        issues
    }
}

impl FromIterator<FieldDefinition> for FieldSchema {
    fn from_iter<T: IntoIterator<Item = FieldDefinition>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn check_value(field: &FieldDefinition, value: &FieldValue) -> Option<EntryIssue> {
    let wrong_shape = || EntryIssue::WrongShape {
        field: field.name.clone(),
        expected: field.kind,
    };
    let unknown_option = |value: &str| EntryIssue::UnknownOption {
        field: field.name.clone(),
        value: value.to_string(),
    };

    match (field.kind, value) {
        (FieldKind::Text | FieldKind::Textarea, FieldValue::Text(_) | FieldValue::Number(_)) => {
            None
        }
        (FieldKind::Number, FieldValue::Number(_)) => None,
        (FieldKind::Number, FieldValue::Text(text)) if text.trim().parse::<f64>().is_ok() => None,
        (FieldKind::Select, FieldValue::Text(choice)) => {
            (!field.allows_option(choice)).then(|| unknown_option(choice))
        }
        (FieldKind::Multiselect, FieldValue::Text(choice)) => {
            (!field.allows_option(choice)).then(|| unknown_option(choice))
        }
        (FieldKind::Multiselect, FieldValue::List(choices)) => choices
            .iter()
            .find(|choice| !field.allows_option(choice))
            .map(|choice| unknown_option(choice)),
        (FieldKind::File, FieldValue::Text(reference)) if !reference.trim().is_empty() => None,
        (FieldKind::File, FieldValue::Document(serde_json::Value::Object(_))) => None,
        (FieldKind::Date, FieldValue::Text(raw)) => {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .err()
                .map(|_| EntryIssue::InvalidDate {
                    field: field.name.clone(),
                    value: raw.clone(),
                })
        }
        _ => Some(wrong_shape()),
    }
}

/// Value submitted for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Document(serde_json::Value),
}

impl FieldValue {
    /// Blank text, empty lists, and JSON null count as not submitted.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Document(document) => document.is_null(),
            FieldValue::Flag(_) | FieldValue::Number(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Document(value)
    }
}

/// Reference to an uploaded proof document kept by the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub storage_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One filled-in instance of a competency item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionEntry {
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<FileReference>,
}

impl SubmissionEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_attachment(mut self, storage_key: impl Into<String>) -> Self {
        self.attachment = Some(FileReference {
            storage_key: storage_key.into(),
            name: None,
        });
        self
    }

    /// Submitted value for `name`, skipping blank values.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name).filter(|value| !value.is_blank())
    }

    /// The only submitted value when the entry carries exactly one field.
    pub fn sole_value(&self) -> Option<&FieldValue> {
        let mut values = self.values.values();
        match (values.next(), values.next()) {
            (Some(value), None) if !value.is_blank() => Some(value),
            _ => None,
        }
    }
}

/// Conformance problem between a submission entry and the template schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum EntryIssue {
    #[error("required field `{field}` is missing")]
    MissingRequired { field: String },
    #[error("field `{field}` is not declared by the template")]
    UnknownField { field: String },
    #[error("field `{field}` expects a {expected} value")]
    WrongShape { field: String, expected: FieldKind },
    #[error("field `{field}` has `{value}` outside its options")]
    UnknownOption { field: String, value: String },
    #[error("field `{field}` has `{value}`, expected YYYY-MM-DD")]
    InvalidDate { field: String, value: String },
}
