//! Variables and callbacks collected from a menu tree before emission.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use menukit::{
    Value,
    data::{DataType, ItemKind, MenuConfig, MenuTree},
};

use crate::{
    names::{
        app_callback_name, change_callback_name, exhibition_callback_name, sanitize,
        toggle_callback_name,
    },
    utils::number_literal,
};

/// One field of `menu_variables_t`.
#[derive(Debug, Clone, PartialEq)]
pub struct PooledVariable {
    pub data_type: DataType,
    pub value: f64,
}

impl PooledVariable {
    /// C literal of the initial value.
    pub fn literal(&self) -> String {
        number_literal(self.data_type, self.value)
    }
}

/// Fields of `menu_variables_t`, keyed by sanitized name in emission order.
#[derive(Debug, Clone, Default)]
pub struct VariablePool {
    entries: IndexMap<String, PooledVariable>,
}

impl VariablePool {
    /// Config variables first, then every Toggle and Changeable node.
    ///
    /// A tree variable replaces a config variable of the same name in place.
    pub fn collect(config: &MenuConfig) -> Self {
        let mut pool = Self::default();

        for (name, value) in &config.variables {
            match config_variable(value) {
                Some(var) => {
                    pool.entries.insert(sanitize(name), var);
                }
                None => warn!("variable `{name}` has unsupported value {value}, skipped"),
            }
        }

        let tree = &config.tree;
        if let Some(root) = tree.root() {
            for id in tree.preorder(root) {
                let (name, var) = match &tree[id].kind {
                    ItemKind::Toggle(t) => (
                        &t.variable_name,
                        PooledVariable {
                            data_type: DataType::Bool,
                            value: if t.state { 1.0 } else { 0.0 },
                        },
                    ),
                    ItemKind::Changeable(c) => (
                        &c.variable_name,
                        PooledVariable {
                            data_type: c.data_type(),
                            value: c.initial_value(),
                        },
                    ),
                    ItemKind::Normal | ItemKind::Application(_) | ItemKind::Exhibition(_) => {
                        continue;
                    }
                };
                pool.entries.insert(sanitize(name), var);
            }
        }

        debug!("collected {} variables", pool.entries.len());
        pool
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&PooledVariable> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PooledVariable)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// C type of a variable given in the configuration.
///
/// Integers take the narrowest of `int8_t`, `int16_t` and `int32_t` that
/// holds them.
fn config_variable(value: &Value) -> Option<PooledVariable> {
    let (data_type, value) = match value {
        Value::Bool(b) => (DataType::Bool, if *b { 1.0 } else { 0.0 }),
        Value::Number(n) if n.is_f64() => (DataType::Float, n.as_f64()?),
        Value::Number(n) => {
            let v = n.as_f64()?;
            let data_type = if (-128.0..=127.0).contains(&v) {
                DataType::Int8
            } else if (-32768.0..=32767.0).contains(&v) {
                DataType::Int16
            } else {
                DataType::Int32
            };
            (data_type, v)
        }
        _ => return None,
    };
    Some(PooledVariable { data_type, value })
}

/// Parameter list of a generated callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackSignature {
    Toggle,
    Change,
    App,
    Exhibition { total_pages: u8 },
}

impl CallbackSignature {
    pub fn params(self) -> &'static str {
        match self {
            CallbackSignature::Toggle => "bool state",
            CallbackSignature::Change => "void* value",
            CallbackSignature::App => "void** args",
            CallbackSignature::Exhibition { total_pages: 1 } => "navigator_t* nav",
            CallbackSignature::Exhibition { .. } => {
                "navigator_t* nav, uint8_t current_page, uint8_t total_pages"
            }
        }
    }
}

/// Callback a node refers to, or `None` when it has none.
///
/// Exhibition nodes always own a stub; whether the menu item references it
/// still depends on `enable_callback`.
pub fn node_callback(kind: &ItemKind, name: &str) -> Option<(String, CallbackSignature)> {
    match kind {
        ItemKind::Toggle(t) if t.enable_callback => Some((
            toggle_callback_name(&t.variable_name),
            CallbackSignature::Toggle,
        )),
        ItemKind::Changeable(c) if c.enable_callback => Some((
            change_callback_name(&c.variable_name),
            CallbackSignature::Change,
        )),
        ItemKind::Application(a) if a.enable_callback => {
            Some((app_callback_name(name), CallbackSignature::App))
        }
        ItemKind::Exhibition(e) => Some((
            exhibition_callback_name(name),
            CallbackSignature::Exhibition {
                total_pages: e.total_pages(),
            },
        )),
        ItemKind::Normal
        | ItemKind::Toggle(_)
        | ItemKind::Changeable(_)
        | ItemKind::Application(_) => None,
    }
}

/// Name the menu item passes to the runtime, or `NULL`.
pub fn callback_reference(kind: &ItemKind, name: &str) -> String {
    match (node_callback(kind, name), kind.enable_callback()) {
        (Some((cb, _)), Some(true)) => cb,
        _ => "NULL".to_string(),
    }
}

/// Callback stubs keyed by name.
///
/// Nodes whose callbacks share a name share one stub; the last node walked
/// decides its signature.
#[derive(Debug, Clone, Default)]
pub struct CallbackPool {
    entries: BTreeMap<String, CallbackSignature>,
}

impl CallbackPool {
    pub fn collect(tree: &MenuTree) -> Self {
        let mut pool = Self::default();
        if let Some(root) = tree.root() {
            for id in tree.preorder(root) {
                let item = &tree[id];
                if let Some((name, sig)) = node_callback(&item.kind, &item.name) {
                    pool.entries.insert(name, sig);
                }
            }
        }
        debug!("collected {} callbacks", pool.entries.len());
        pool
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Stubs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, CallbackSignature)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
