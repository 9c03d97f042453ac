use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::model::{FieldKind, FieldSpec, Schema};
use crate::error::ConfigError;

/// Column layout plus the validity policy for one dataset variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub schema: Schema,
    /// Numeric fields every record must have to be kept.
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for PipelineConfig {
    /// The cars dataset: identifier, two categorical columns, seven numeric
    /// ones, and rows without MPG, Horsepower or Weight dropped.
    fn default() -> Self {
        let schema = Schema::new(vec![
            FieldSpec::categorical("Car"),
            FieldSpec::categorical("Manufacturer"),
            FieldSpec::numeric("MPG"),
            FieldSpec::numeric("Cylinders"),
            FieldSpec::numeric("Displacement"),
            FieldSpec::numeric("Horsepower"),
            FieldSpec::numeric("Weight"),
            FieldSpec::numeric("Acceleration"),
            FieldSpec::numeric("Model_Year"),
            FieldSpec::categorical("Origin"),
        ])
        .with_identifier("Car");

        PipelineConfig {
            schema,
            required: vec!["MPG".into(), "Horsepower".into(), "Weight".into()],
        }
    }
}

impl PipelineConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for field in &self.schema.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::DuplicateField(field.name.clone()));
            }
        }

        if let Some(id) = &self.schema.identifier {
            if self.schema.kind_of(id) != Some(FieldKind::Categorical) {
                return Err(ConfigError::BadIdentifier(id.clone()));
            }
        }

        for field in &self.required {
            if self.schema.kind_of(field) != Some(FieldKind::Numeric) {
                return Err(ConfigError::BadRequired(field.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.schema.missing, "NA");
        assert_eq!(config.schema.fields.len(), 10);
    }

    #[test]
    fn variant_without_weight_requirement() {
        let config = PipelineConfig::from_json(
            r#"{
                "schema": {
                    "identifier": "Car",
                    "fields": [
                        {"name": "Car", "kind": "categorical"},
                        {"name": "MPG", "kind": "numeric"},
                        {"name": "Weight", "kind": "numeric"}
                    ]
                },
                "required": ["MPG"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.required, vec!["MPG".to_string()]);
        assert_eq!(config.schema.missing, "NA");
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let err = PipelineConfig::from_json(
            r#"{"schema": {"fields": [
                {"name": "MPG", "kind": "numeric"},
                {"name": "MPG", "kind": "categorical"}
            ]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateField(f) if f == "MPG"));
    }

    #[test]
    fn identifier_must_be_categorical() {
        let err = PipelineConfig::from_json(
            r#"{"schema": {"identifier": "MPG", "fields": [{"name": "MPG", "kind": "numeric"}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::BadIdentifier(_)));
    }

    #[test]
    fn required_fields_must_be_numeric() {
        let err = PipelineConfig::from_json(
            r#"{"schema": {"fields": [{"name": "Origin", "kind": "categorical"}]},
                "required": ["Origin"]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::BadRequired(f) if f == "Origin"));
    }

    #[test]
    fn config_is_loaded_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&PipelineConfig::default()).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        let loaded = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(loaded, PipelineConfig::default());
    }

    #[test]
    fn unreadable_config_reports_path() {
        let err = PipelineConfig::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/config.json"));
    }
}
