use serde::{Deserialize, Serialize};

use super::{GradeMapping, GradeTable, MappingValue};

/// How much of a template's grade table downstream consumers may change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeEditMode {
    Fixed,
    ScoreOnly,
    #[default]
    Flexible,
}

impl GradeEditMode {
    pub const fn label(self) -> &'static str {
        match self {
            GradeEditMode::Fixed => "fixed",
            GradeEditMode::ScoreOnly => "score_only",
            GradeEditMode::Flexible => "flexible",
        }
    }
}

/// A single change requested against a grade table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GradeEdit {
    SetScore { index: usize, score: i32 },
    SetRawValue { index: usize, raw_value: MappingValue },
    SetLabel { index: usize, label: Option<String> },
    Insert { index: usize, mapping: GradeMapping },
    Remove { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GradeEditError {
    #[error("template is input only and has no grade table")]
    NoScoring,
    #[error("grade table is locked")]
    Locked,
    #[error("only scores may change in {} mode", GradeEditMode::ScoreOnly.label())]
    ScoresOnly,
    #[error("mapping {index} is pinned")]
    Pinned { index: usize },
    #[error("mapping index {index} out of range for {len} mapping(s)")]
    OutOfRange { index: usize, len: usize },
}

impl GradeTable {
    /// Apply `edit` under `mode`, leaving the table untouched on refusal.
    pub fn apply(&mut self, edit: GradeEdit, mode: GradeEditMode) -> Result<(), GradeEditError> {
        if mode == GradeEditMode::Fixed {
            return Err(GradeEditError::Locked);
        }

        let len = self.len();
        let mappings = self.mappings_mut();

        match edit {
            GradeEdit::SetScore { index, score } => {
                let mapping = mappings
                    .get_mut(index)
                    .ok_or(GradeEditError::OutOfRange { index, len })?;
                mapping.score = score;
            }
            GradeEdit::SetRawValue { index, raw_value } => {
                require_flexible(mode)?;
                let mapping = mappings
                    .get_mut(index)
                    .ok_or(GradeEditError::OutOfRange { index, len })?;
                if mapping.fixed {
                    return Err(GradeEditError::Pinned { index });
                }
                mapping.raw_value = raw_value;
            }
            GradeEdit::SetLabel { index, label } => {
                require_flexible(mode)?;
                let mapping = mappings
                    .get_mut(index)
                    .ok_or(GradeEditError::OutOfRange { index, len })?;
                mapping.label = label;
            }
            GradeEdit::Insert { index, mapping } => {
                require_flexible(mode)?;
                if index > len {
                    return Err(GradeEditError::OutOfRange { index, len });
                }
                mappings.insert(index, mapping);
            }
            GradeEdit::Remove { index } => {
                require_flexible(mode)?;
                let mapping = mappings
                    .get(index)
                    .ok_or(GradeEditError::OutOfRange { index, len })?;
                if mapping.fixed {
                    return Err(GradeEditError::Pinned { index });
                }
                mappings.remove(index);
            }
        }

        Ok(())
    }
}

fn require_flexible(mode: GradeEditMode) -> Result<(), GradeEditError> {
    match mode {
        GradeEditMode::Flexible => Ok(()),
        GradeEditMode::ScoreOnly => Err(GradeEditError::ScoresOnly),
        GradeEditMode::Fixed => Err(GradeEditError::Locked),
    }
}
