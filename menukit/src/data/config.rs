use std::{fs, path::Path, time::SystemTime};

use anyhow::Context;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::data::{ItemKindTag, MenuItem, MenuTree, ModelError};

/// A whole menu definition: the tree plus root-level manual overrides.
#[derive(Debug, Clone, Default)]
pub struct MenuConfig {
    /// Arena holding the menu; `tree.root()` is the configuration's root.
    pub tree: MenuTree,
    /// Extra variables merged into the generated variable pool.
    pub variables: IndexMap<String, Value>,
    /// Callback bodies keyed by callback name.
    pub callbacks: IndexMap<String, String>,
}

impl MenuConfig {
    /// Empty configuration without a root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh configuration with a `Main` submenu as root.
    pub fn new_file() -> Self {
        let mut config = Self::new();
        let root = config.tree.insert(MenuItem::new("Main", ItemKindTag::Normal));
        config.tree.root = Some(root);
        config
    }

    pub fn add_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn add_callback(&mut self, name: impl Into<String>, code: impl Into<String>) {
        self.callbacks.insert(name.into(), code.into());
    }

    /// JSON document of the configuration.
    pub fn as_json(&self) -> Value {
        let mut obj = Map::new();
        let root = self
            .tree
            .root()
            .map(|r| self.tree.item_as_json(r))
            .unwrap_or(Value::Null);
        obj.insert("root_item".into(), root);
        obj.insert(
            "variables".into(),
            Value::Object(
                self.variables
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        );
        obj.insert(
            "callbacks".into(),
            Value::Object(
                self.callbacks
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        );
        Value::Object(obj)
    }

    /// Build a configuration from its JSON document.
    ///
    /// The structure is repaired after loading, so a hand-edited file with
    /// children under a leaf kind still yields a valid tree.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] naming the offending location when a field
    /// is missing or has the wrong JSON type.
    pub fn from_json(value: &Value) -> Result<Self, ModelError> {
        let obj = value.as_object().ok_or_else(|| ModelError::TypeMismatch {
            path: "$".into(),
            expected: "object".into(),
            actual: format!("{value}"),
        })?;

        let mut config = Self::new();
        match obj.get("root_item") {
            None | Some(Value::Null) => {}
            Some(root) => {
                let id = config.tree.item_from_json(root, "root_item")?;
                config.tree.root = Some(id);
            }
        }

        match obj.get("variables") {
            None | Some(Value::Null) => {}
            Some(Value::Object(vars)) => {
                for (k, v) in vars {
                    config.variables.insert(k.clone(), v.clone());
                }
            }
            Some(other) => return Err(object_expected("variables", other)),
        }

        match obj.get("callbacks") {
            None | Some(Value::Null) => {}
            Some(Value::Object(cbs)) => {
                for (k, v) in cbs {
                    let Value::String(code) = v else {
                        return Err(ModelError::TypeMismatch {
                            path: format!("callbacks.{k}"),
                            expected: "string".into(),
                            actual: format!("{v}"),
                        });
                    };
                    config.callbacks.insert(k.clone(), code.clone());
                }
            }
            Some(other) => return Err(object_expected("callbacks", other)),
        }

        let repaired = config.tree.repair_structure();
        if repaired > 0 {
            warn!("relocated {repaired} menu items found under leaf items");
        }
        Ok(config)
    }

    pub fn to_json_string(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.as_json())?)
    }

    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_str(s)?;
        Ok(Self::from_json(&value)?)
    }

    /// Read a configuration file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read menu file {}", path.display()))?;
        let config = Self::from_json_str(&content)
            .with_context(|| format!("failed to parse menu file {}", path.display()))?;
        info!("loaded {} menu items from {}", config.tree.len(), path.display());
        Ok(config)
    }

    /// Write the configuration, keeping a timestamped backup of the
    /// previous file as `<stem>.bk-<unix>.json`.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let s = self.to_json_string()?;

        if path.exists() {
            let bk = format!(
                "bk-{}.json",
                SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)?
                    .as_secs()
            );
            let backup_path = path.with_extension(bk);
            fs::copy(path, &backup_path).with_context(|| {
                format!("failed to back up {} to {}", path.display(), backup_path.display())
            })?;
            debug!("backup written to {}", backup_path.display());
        }

        fs::write(path, s).with_context(|| format!("failed to write {}", path.display()))?;
        info!("saved menu to {}", path.display());
        Ok(())
    }
}

fn object_expected(path: &str, actual: &Value) -> ModelError {
    ModelError::TypeMismatch {
        path: path.into(),
        expected: "object".into(),
        actual: format!("{actual}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataType, ItemKind};
    use serde_json::json;

    #[test]
    fn test_new_file_has_main_root() {
        let config = MenuConfig::new_file();
        let root = config.tree.root().unwrap();
        assert_eq!(config.tree[root].name, "Main");
        assert_eq!(config.tree[root].tag(), ItemKindTag::Normal);
    }

    #[test]
    fn test_json_document_shape() {
        let mut config = MenuConfig::new_file();
        config.add_variable("threshold", 3);
        config.add_callback("Light_Toggle_Callback", "puts(\"hi\");");
        let v = config.as_json();
        assert_eq!(v["root_item"]["name"], "Main");
        assert_eq!(v["variables"]["threshold"], 3);
        assert!(v["root_item"].get("children").is_none());
        assert!(v["root_item"].get("variable_name").is_none());
    }

    #[test]
    fn test_round_trip_all_kinds() {
        let doc = json!({
            "root_item": {
                "name": "Main", "type": "Normal", "id": "r", "is_locked": true,
                "children": [
                    {"name": "Led", "type": "Toggle", "id": "a", "is_locked": true,
                     "variable_name": "led_on", "state": true, "enable_callback": true},
                    {"name": "Gain", "type": "Changeable", "id": "b", "is_locked": true,
                     "variable_name": "gain", "data_type": "int16", "min_val": -5,
                     "max_val": 5, "step_val": 2, "current_val": 3, "enable_callback": false},
                    {"name": "Run", "type": "Application", "id": "c", "is_locked": true,
                     "enable_callback": false},
                    {"name": "Info", "type": "Exhibition", "id": "d", "is_locked": true,
                     "total_pages": 3, "enable_callback": true}
                ]
            },
            "variables": {"extra": 1.5},
            "callbacks": {"Run_App_Callback": "run();"}
        });
        let config = MenuConfig::from_json(&doc).unwrap();
        assert_eq!(config.as_json(), doc);

        let root = config.tree.root().unwrap();
        let gain = config.tree[root].children()[1];
        let ItemKind::Changeable(c) = &config.tree[gain].kind else {
            panic!("gain is not changeable");
        };
        assert_eq!(c.data_type(), DataType::Int16);
        assert_eq!(c.current_val(), 3.0);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let config = MenuConfig::from_json(&json!({"root_item": null})).unwrap();
        assert!(config.tree.root().is_none());
        assert!(config.variables.is_empty());
    }

    #[test]
    fn test_bad_document() {
        assert!(MenuConfig::from_json(&json!([])).is_err());
        let err = MenuConfig::from_json(&json!({"variables": 3})).unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { .. }));
        let err = MenuConfig::from_json(&json!({"root_item": {"name": "x"}})).unwrap_err();
        assert!(matches!(err, ModelError::MissingField { .. }));
    }

    #[test]
    fn test_save_writes_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.json");

        let config = MenuConfig::new_file();
        config.save(&path).unwrap();
        config.save(&path).unwrap();

        let backups = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("menu.bk-"))
            .count();
        assert_eq!(backups, 1);

        let loaded = MenuConfig::load(&path).unwrap();
        assert_eq!(loaded.as_json(), config.as_json());
    }
}
