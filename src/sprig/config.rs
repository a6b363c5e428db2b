use crate::error::{Result, SprigError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_ORDER_FIELD: &str = "position";
const DEFAULT_TITLE_FIELD: &str = "name";

/// What deleting a record that still has children does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Refuse; children must be moved or deleted first
    #[default]
    Reject,
    /// Remove the whole subtree
    Cascade,
    /// Hand the children to the deleted record's parent
    Reparent,
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeletePolicy::Reject => "reject",
            DeletePolicy::Cascade => "cascade",
            DeletePolicy::Reparent => "reparent",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DeletePolicy {
    type Err = SprigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(DeletePolicy::Reject),
            "cascade" => Ok(DeletePolicy::Cascade),
            "reparent" => Ok(DeletePolicy::Reparent),
            other => Err(SprigError::Config(format!(
                "Unknown delete policy '{}' (expected reject, cascade or reparent)",
                other
            ))),
        }
    }
}

/// Outline configuration, stored in .sprig/config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SprigConfig {
    /// Field holding the position label; also the sibling sort key
    #[serde(default = "default_order_field")]
    pub order_field: String,

    /// Number root records too (`1`, `2`, ...) instead of leaving them unlabelled
    #[serde(default)]
    pub label_roots: bool,

    #[serde(default)]
    pub delete_policy: DeletePolicy,

    /// Field shown as the record's title when rendering
    #[serde(default = "default_title_field")]
    pub title_field: String,
}

fn default_order_field() -> String {
    DEFAULT_ORDER_FIELD.to_string()
}

fn default_title_field() -> String {
    DEFAULT_TITLE_FIELD.to_string()
}

impl Default for SprigConfig {
    fn default() -> Self {
        Self {
            order_field: default_order_field(),
            label_roots: false,
            delete_policy: DeletePolicy::default(),
            title_field: default_title_field(),
        }
    }
}

impl SprigConfig {
    pub const KEYS: [&'static str; 4] = ["order-field", "label-roots", "delete-policy", "title-field"];

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: SprigConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field names that may have been hand-edited into config.json.
    pub fn validate(&self) -> Result<()> {
        field_name("order-field", &self.order_field)?;
        field_name("title-field", &self.title_field)?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "order-field" => Ok(self.order_field.clone()),
            "label-roots" => Ok(self.label_roots.to_string()),
            "delete-policy" => Ok(self.delete_policy.to_string()),
            "title-field" => Ok(self.title_field.clone()),
            other => Err(unknown_key(other)),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "order-field" => self.order_field = field_name(key, value)?,
            "label-roots" => {
                self.label_roots = value.trim().parse().map_err(|_| {
                    SprigError::Config(format!("label-roots expects true or false, got '{}'", value))
                })?
            }
            "delete-policy" => self.delete_policy = value.parse()?,
            "title-field" => self.title_field = field_name(key, value)?,
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }

    pub fn numbering(&self) -> crate::numbering::NumberingOptions {
        crate::numbering::NumberingOptions {
            order_field: self.order_field.clone(),
            label_roots: self.label_roots,
        }
    }
}

fn field_name(key: &str, value: &str) -> Result<String> {
    let name = value.trim();
    if name.is_empty() || crate::model::is_structural_key(name) {
        return Err(SprigError::Config(format!(
            "'{}' cannot be used as {}",
            value, key
        )));
    }
    Ok(name.to_string())
}

fn unknown_key(key: &str) -> SprigError {
    SprigError::Config(format!(
        "Unknown config key '{}' (expected one of: {})",
        key,
        SprigConfig::KEYS.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults() {
        let config = SprigConfig::default();
        assert_eq!(config.order_field, "position");
        assert!(!config.label_roots);
        assert_eq!(config.delete_policy, DeletePolicy::Reject);
        assert_eq!(config.title_field, "name");
    }

    #[test]
    fn load_missing_config_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = SprigConfig::load(dir.path().join("nowhere")).unwrap();
        assert_eq!(config, SprigConfig::default());
    }

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let mut config = SprigConfig::default();
        config.set("delete-policy", "cascade").unwrap();
        config.set("label-roots", "true").unwrap();
        config.save(dir.path()).unwrap();

        let loaded = SprigConfig::load(dir.path()).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.get("delete-policy").unwrap(), "cascade");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{"order_field": "rank"}"#).unwrap();

        let config = SprigConfig::load(dir.path()).unwrap();
        assert_eq!(config.order_field, "rank");
        assert_eq!(config.title_field, "name");
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut config = SprigConfig::default();
        assert!(config.set("label-roots", "maybe").is_err());
        assert!(config.set("delete-policy", "shred").is_err());
        assert!(config.set("order-field", "parent").is_err());
        assert!(config.set("colour", "blue").is_err());
        assert_eq!(config, SprigConfig::default());
    }

    #[test]
    fn load_rejects_structural_field_names() {
        let dir = tempdir().unwrap();
        for content in [
            r#"{"order_field": "parent"}"#,
            r#"{"order_field": "id"}"#,
            r#"{"title_field": "children"}"#,
            r#"{"order_field": "  "}"#,
        ] {
            fs::write(dir.path().join(CONFIG_FILENAME), content).unwrap();
            assert!(
                matches!(SprigConfig::load(dir.path()), Err(SprigError::Config(_))),
                "accepted {}",
                content
            );
        }
    }

    #[test]
    fn delete_policy_round_trips_through_text() {
        for policy in [DeletePolicy::Reject, DeletePolicy::Cascade, DeletePolicy::Reparent] {
            assert_eq!(policy.to_string().parse::<DeletePolicy>().unwrap(), policy);
        }
        assert_eq!(
            serde_json::to_string(&DeletePolicy::Reparent).unwrap(),
            "\"reparent\""
        );
    }
}
