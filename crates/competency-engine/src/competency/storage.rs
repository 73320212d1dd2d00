//! Persistence boundary. Stored templates keep their schema, mappings, and scoring settings as
//! JSON strings; this is the only place those strings are parsed or produced.

use serde::{Deserialize, Serialize};

use super::grades::GradeTable;
use super::schema::{DataSource, FieldSchema};
use super::template::{ScoringConfig, Template, TemplateDraft, TemplateId};

/// Row shape used by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub data_source: DataSource,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub has_scoring: bool,
    #[serde(default)]
    pub fields_schema: Option<String>,
    #[serde(default)]
    pub default_mappings: Option<String>,
    #[serde(default)]
    pub scoring_config: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("stored {column} is not valid JSON: {source}")]
    Malformed {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("template `{id}` is marked as scored but has no scoring config")]
    MissingScoring { id: String },
}

impl TryFrom<StoredTemplate> for Template {
    type Error = StorageError;

    fn try_from(stored: StoredTemplate) -> Result<Self, Self::Error> {
        let fields: FieldSchema = decode_column("fields_schema", stored.fields_schema.as_deref())?
            .unwrap_or_default();

        let scoring = if stored.has_scoring {
            let mut config: ScoringConfig =
                decode_column("scoring_config", stored.scoring_config.as_deref())?.ok_or_else(
                    || StorageError::MissingScoring {
                        id: stored.id.clone(),
                    },
                )?;
            if let Some(table) =
                decode_column::<GradeTable>("default_mappings", stored.default_mappings.as_deref())?
            {
                config.grade_table = table;
            }
            Some(config)
        } else {
            None
        };

        Ok(Template::from(TemplateDraft {
            id: TemplateId(stored.id),
            name: stored.name,
            data_source: stored.data_source,
            repeatable: stored.repeatable,
            fields,
            scoring,
        }))
    }
}

impl From<&Template> for StoredTemplate {
    fn from(template: &Template) -> Self {
        let fields_schema = (!template.fields().is_empty()).then(|| encode(template.fields()));

        let (scoring_config, default_mappings) = match template.scoring() {
            Some(config) => {
                let mut settings = config.clone();
                let table = std::mem::take(&mut settings.grade_table);
                (Some(encode(&settings)), Some(encode(&table)))
            }
            None => (None, None),
        };

        Self {
            id: template.id().0.clone(),
            name: template.name().to_string(),
            data_source: template.data_source(),
            repeatable: template.repeatable(),
            has_scoring: template.has_scoring(),
            fields_schema,
            default_mappings,
            scoring_config,
        }
    }
}

fn decode_column<T>(column: &'static str, raw: Option<&str>) -> Result<Option<T>, StorageError>
where
    T: for<'de> Deserialize<'de>,
{
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => serde_json::from_str(raw)
            .map(Some)
            .map_err(|source| StorageError::Malformed { column, source }),
        None => Ok(None),
    }
}

fn encode<T: Serialize>(value: &T) -> String {
    // plain data structs with string keys always serialize
    serde_json::to_string(value).unwrap_or_default()
}
