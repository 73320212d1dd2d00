use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::{parse_flag, parse_number, GradeMapping, GradeTable, MappingValue};

#[derive(Debug, thiserror::Error)]
pub enum GradeImportError {
    #[error("failed to read grade table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid grade table CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: raw_value is empty")]
    EmptyRawValue { line: usize },
    #[error("line {line}: `{value}` is not a valid fixed flag")]
    InvalidFlag { line: usize, value: String },
}

/// Bulk loader for grade tables exported as `raw_value,score,label,fixed` CSV.
pub struct GradeTableImporter;

impl GradeTableImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<GradeTable, GradeImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<GradeTable, GradeImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut mappings = Vec::new();

        for (position, row) in csv_reader.deserialize::<GradeRow>().enumerate() {
            // header occupies line 1
            let line = position + 2;
            mappings.push(row?.into_mapping(line)?);
        }

        Ok(GradeTable::new(mappings))
    }
}

#[derive(Debug, Deserialize)]
struct GradeRow {
    raw_value: String,
    score: i32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    label: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    fixed: Option<String>,
}

impl GradeRow {
    fn into_mapping(self, line: usize) -> Result<GradeMapping, GradeImportError> {
        if self.raw_value.is_empty() {
            return Err(GradeImportError::EmptyRawValue { line });
        }

        let fixed = match self.fixed {
            Some(value) => {
                parse_flag(&value).ok_or(GradeImportError::InvalidFlag { line, value })?
            }
            None => false,
        };

        Ok(GradeMapping {
            raw_value: classify_raw_value(self.raw_value),
            score: self.score,
            label: self.label,
            fixed,
        })
    }
}

fn classify_raw_value(raw: String) -> MappingValue {
    if let Some(number) = parse_number(&raw) {
        return MappingValue::Number(number);
    }

    match raw.to_ascii_lowercase().as_str() {
        "true" => MappingValue::Flag(true),
        "false" => MappingValue::Flag(false),
        _ => MappingValue::Text(raw),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
