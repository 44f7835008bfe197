//! Property edits arriving as text, the way a form field delivers them.
//!
//! Malformed input never fails an edit: the field keeps its last valid
//! value and the caller learns about it through [`EditOutcome::Reverted`].

use std::{fmt, str::FromStr};

use serde_json::Value;

use crate::data::{
    DataType, ItemKind, ItemKindTag, MenuConfig, MenuTree, ModelError, NodeId,
};

/// Editable property of a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditField {
    Name,
    Kind,
    VariableName,
    DataType,
    MinVal,
    MaxVal,
    StepVal,
    State,
    EnableCallback,
    TotalPages,
}

impl EditField {
    pub fn as_str(self) -> &'static str {
        match self {
            EditField::Name => "name",
            EditField::Kind => "type",
            EditField::VariableName => "variable_name",
            EditField::DataType => "data_type",
            EditField::MinVal => "min_val",
            EditField::MaxVal => "max_val",
            EditField::StepVal => "step_val",
            EditField::State => "state",
            EditField::EnableCallback => "enable_callback",
            EditField::TotalPages => "total_pages",
        }
    }
}

impl fmt::Display for EditField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "name" => EditField::Name,
            "type" | "kind" => EditField::Kind,
            "variable_name" => EditField::VariableName,
            "data_type" => EditField::DataType,
            "min_val" => EditField::MinVal,
            "max_val" => EditField::MaxVal,
            "step_val" => EditField::StepVal,
            "state" => EditField::State,
            "enable_callback" => EditField::EnableCallback,
            "total_pages" => EditField::TotalPages,
            other => return Err(format!("unknown property `{other}`")),
        })
    }
}

/// One pending text edit of a node property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEdit {
    pub node: NodeId,
    pub field: EditField,
    pub text: String,
}

impl PropertyEdit {
    pub fn new(node: NodeId, field: EditField, text: impl Into<String>) -> Self {
        Self {
            node,
            field,
            text: text.into(),
        }
    }
}

/// Result of applying a [`PropertyEdit`].
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The value was stored, possibly normalized (clamped, swapped).
    Applied,
    /// The text did not parse; the field kept `kept`.
    Reverted { field: EditField, kept: String },
    /// The node's kind has no such field.
    NotApplicable,
}

impl MenuTree {
    /// Apply a batch of edits in order, returning each outcome.
    pub fn apply_edits(
        &mut self,
        edits: impl IntoIterator<Item = PropertyEdit>,
    ) -> Result<Vec<EditOutcome>, ModelError> {
        edits
            .into_iter()
            .map(|e| self.apply_text_edit(e.node, e.field, &e.text))
            .collect()
    }

    /// Parse `text` for `field` and store it on `node`.
    ///
    /// # Errors
    ///
    /// Only an unknown `node` is an error; bad text yields
    /// [`EditOutcome::Reverted`].
    pub fn apply_text_edit(
        &mut self,
        node: NodeId,
        field: EditField,
        text: &str,
    ) -> Result<EditOutcome, ModelError> {
        let item = self.get_mut(node).ok_or(ModelError::NoSuchNode(node))?;
        let text = text.trim();

        let outcome = match field {
            EditField::Name => {
                item.name = text.to_string();
                EditOutcome::Applied
            }
            EditField::Kind => match text.parse::<ItemKindTag>() {
                Ok(tag) => {
                    item.set_kind(tag);
                    EditOutcome::Applied
                }
                Err(_) => reverted(field, item.tag()),
            },
            _ => edit_kind_field(&mut item.kind, field, text),
        };

        if let EditOutcome::Reverted { field, kept } = &outcome {
            warn!("invalid {field} `{text}` for `{}`, keeping {kept}", item.name);
        }
        Ok(outcome)
    }
}

fn edit_kind_field(kind: &mut ItemKind, field: EditField, text: &str) -> EditOutcome {
    match (field, kind) {
        (EditField::VariableName, ItemKind::Toggle(t)) => {
            t.variable_name = text.to_string();
            EditOutcome::Applied
        }
        (EditField::VariableName, ItemKind::Changeable(c)) => {
            c.variable_name = text.to_string();
            EditOutcome::Applied
        }
        (EditField::DataType, ItemKind::Changeable(c)) => match text.parse::<DataType>() {
            Ok(t) => {
                c.set_data_type(t);
                EditOutcome::Applied
            }
            Err(_) => reverted(field, c.data_type()),
        },
        (EditField::MinVal, ItemKind::Changeable(c)) => match parse_number(text) {
            Some(v) => {
                c.set_min_val(v);
                EditOutcome::Applied
            }
            None => reverted(field, c.min_val()),
        },
        (EditField::MaxVal, ItemKind::Changeable(c)) => match parse_number(text) {
            Some(v) => {
                c.set_max_val(v);
                EditOutcome::Applied
            }
            None => reverted(field, c.max_val()),
        },
        (EditField::StepVal, ItemKind::Changeable(c)) => match parse_number(text) {
            Some(v) => {
                c.set_step_val(v);
                EditOutcome::Applied
            }
            None => reverted(field, c.step_val()),
        },
        (EditField::State, ItemKind::Toggle(t)) => match parse_bool(text) {
            Some(b) => {
                t.state = b;
                EditOutcome::Applied
            }
            None => reverted(field, t.state),
        },
        (EditField::TotalPages, ItemKind::Exhibition(e)) => match text.parse::<u32>() {
            Ok(n) => {
                e.set_total_pages(n);
                EditOutcome::Applied
            }
            Err(_) => reverted(field, e.total_pages()),
        },
        (EditField::EnableCallback, kind) => match (parse_bool(text), kind.enable_callback()) {
            (_, None) => EditOutcome::NotApplicable,
            (Some(b), Some(_)) => {
                kind.set_enable_callback(b);
                EditOutcome::Applied
            }
            (None, Some(cur)) => reverted(field, cur),
        },
        _ => EditOutcome::NotApplicable,
    }
}

fn reverted(field: EditField, kept: impl fmt::Display) -> EditOutcome {
    EditOutcome::Reverted {
        field,
        kept: kept.to_string(),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl MenuConfig {
    /// Merge `name = value` lines into [`MenuConfig::variables`].
    ///
    /// `true`/`false` become booleans, numbers with a `.` floats, other
    /// numbers integers, anything else is kept as a string. Lines without
    /// exactly one `=` are skipped. Returns the number of entries stored.
    pub fn apply_variables_text(&mut self, text: &str) -> usize {
        let mut count = 0;
        for line in text.lines() {
            let mut parts = line.split('=');
            let (Some(name), Some(raw), None) = (parts.next(), parts.next(), parts.next()) else {
                continue;
            };
            let name = name.trim();
            let raw = raw.trim();
            if name.is_empty() {
                continue;
            }
            self.variables.insert(name.to_string(), parse_variable_value(raw));
            count += 1;
        }
        count
    }

    /// Merge callback bodies written as `Name:` headers followed by code.
    ///
    /// Blank lines inside a body are dropped. Returns the number of
    /// callbacks stored.
    pub fn apply_callbacks_text(&mut self, text: &str) -> usize {
        let mut count = 0;
        let mut current: Option<(&str, Vec<&str>)> = None;
        for line in text.lines() {
            if let Some(name) = line.strip_suffix(':') {
                if let Some((n, code)) = current.take() {
                    self.add_callback(n, code.join("\n"));
                    count += 1;
                }
                current = Some((name, Vec::new()));
            } else if !line.trim().is_empty() {
                if let Some((_, code)) = current.as_mut() {
                    code.push(line);
                }
            }
        }
        if let Some((n, code)) = current {
            self.add_callback(n, code.join("\n"));
            count += 1;
        }
        count
    }
}

fn parse_variable_value(raw: &str) -> Value {
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if raw.contains('.') {
        if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            return Value::Number(n);
        }
    } else if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MenuItem;

    fn tree_with(tag: ItemKindTag) -> (MenuTree, NodeId) {
        let mut tree = MenuTree::new();
        let root = tree.add_item(None, MenuItem::new("Main", ItemKindTag::Normal)).unwrap();
        let id = tree.add_item(Some(root), MenuItem::new("Node", tag)).unwrap();
        (tree, id)
    }

    fn changeable(tree: &MenuTree, id: NodeId) -> &crate::data::ChangeableItem {
        match &tree[id].kind {
            ItemKind::Changeable(c) => c,
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_bad_number_keeps_last_value() {
        let (mut tree, id) = tree_with(ItemKindTag::Changeable);
        assert_eq!(
            tree.apply_text_edit(id, EditField::MaxVal, "20").unwrap(),
            EditOutcome::Applied
        );
        let outcome = tree.apply_text_edit(id, EditField::MaxVal, "2x0").unwrap();
        assert_eq!(
            outcome,
            EditOutcome::Reverted {
                field: EditField::MaxVal,
                kept: "20".into()
            }
        );
        assert_eq!(changeable(&tree, id).max_val(), 20.0);
    }

    #[test]
    fn test_edits_normalize() {
        let (mut tree, id) = tree_with(ItemKindTag::Changeable);
        let outcomes = tree
            .apply_edits([
                PropertyEdit::new(id, EditField::DataType, "uint8"),
                PropertyEdit::new(id, EditField::MinVal, "300"),
                PropertyEdit::new(id, EditField::StepVal, "0.2"),
            ])
            .unwrap();
        assert!(outcomes.iter().all(|o| *o == EditOutcome::Applied));
        let c = changeable(&tree, id);
        assert_eq!(c.data_type(), DataType::Uint8);
        assert_eq!((c.min_val(), c.max_val()), (100.0, 255.0));
        assert_eq!(c.step_val(), 1.0);
    }

    #[test]
    fn test_field_not_on_kind() {
        let (mut tree, id) = tree_with(ItemKindTag::Application);
        assert_eq!(
            tree.apply_text_edit(id, EditField::MinVal, "1").unwrap(),
            EditOutcome::NotApplicable
        );
        assert_eq!(
            tree.apply_text_edit(id, EditField::EnableCallback, "false").unwrap(),
            EditOutcome::Applied
        );
        assert_eq!(tree[id].kind.enable_callback(), Some(false));
    }

    #[test]
    fn test_kind_edit_resets() {
        let (mut tree, id) = tree_with(ItemKindTag::Exhibition);
        tree.apply_text_edit(id, EditField::TotalPages, "4").unwrap();
        tree.apply_text_edit(id, EditField::Kind, "Toggle").unwrap();
        assert_eq!(tree[id].effective_name(), "Node");
        assert!(matches!(
            tree.apply_text_edit(id, EditField::Kind, "Slider").unwrap(),
            EditOutcome::Reverted { .. }
        ));
        assert_eq!(tree[id].tag(), ItemKindTag::Toggle);
    }

    #[test]
    fn test_total_pages_rejects_garbage() {
        let (mut tree, id) = tree_with(ItemKindTag::Exhibition);
        let outcome = tree.apply_text_edit(id, EditField::TotalPages, "-2").unwrap();
        assert!(matches!(outcome, EditOutcome::Reverted { .. }));
        tree.apply_text_edit(id, EditField::TotalPages, "0").unwrap();
        let ItemKind::Exhibition(e) = &tree[id].kind else {
            panic!("not exhibition");
        };
        assert_eq!(e.total_pages(), 1);
    }

    #[test]
    fn test_variables_text() {
        let mut config = MenuConfig::new();
        let n = config.apply_variables_text("a = 1\nb = 2.5\nflag = TRUE\nname = abc\nbad\nx=1=2");
        assert_eq!(n, 4);
        assert_eq!(config.variables["a"], Value::from(1));
        assert_eq!(config.variables["b"], Value::from(2.5));
        assert_eq!(config.variables["flag"], Value::Bool(true));
        assert_eq!(config.variables["name"], Value::from("abc"));
    }

    #[test]
    fn test_callbacks_text() {
        let mut config = MenuConfig::new();
        let n = config.apply_callbacks_text("Led_Toggle_Callback:\n    led(state);\n\nRun_App_Callback:\n    run();\n    done();");
        assert_eq!(n, 2);
        assert_eq!(config.callbacks["Led_Toggle_Callback"], "    led(state);");
        assert_eq!(config.callbacks["Run_App_Callback"], "    run();\n    done();");
    }
}
