//! C identifier derivation.
//!
//! Display names and variable names become C identifiers through
//! [`sanitize`] and [`capitalize`]. Names that must be unique across the
//! generated file go through [`UniqueNames`], which appends `_1`, `_2`, ...
//! in first-seen order.

use std::collections::{HashMap, HashSet};

use menukit::data::{MenuItem, MenuTree, NodeId};

/// Name of the function building the root menu.
pub const MAIN_MENU_FUNCTION: &str = "Create_Main_Menu";

/// Replace every non-alphanumeric character with `_`.
///
/// A leading digit gets a `_` prefix and an empty result becomes `item`.
pub fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if out.is_empty() {
        out.push_str("item");
    }
    out
}

/// Sanitize, then upper-case the first letter of every `_`-separated word
/// and lower-case the rest.
///
/// ```rust
/// assert_eq!(menugen::names::capitalize("led brightness"), "Led_Brightness");
/// assert_eq!(menugen::names::capitalize("WIFI__ssid"), "Wifi__Ssid");
/// ```
pub fn capitalize(name: &str) -> String {
    sanitize(name)
        .split('_')
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join("_")
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// `Create_<Name>_Menu` before disambiguation.
pub fn base_function_name(item: &MenuItem) -> String {
    format!("Create_{}_Menu", capitalize(item.effective_name()))
}

/// `menu_<name>` global of the static layout before disambiguation.
pub fn base_static_symbol(item: &MenuItem) -> String {
    format!("menu_{}", sanitize(item.effective_name()).to_lowercase())
}

pub fn toggle_callback_name(variable_name: &str) -> String {
    format!("{}_Toggle_Callback", capitalize(variable_name))
}

pub fn change_callback_name(variable_name: &str) -> String {
    format!("{}_Change_Callback", capitalize(variable_name))
}

pub fn app_callback_name(name: &str) -> String {
    format!("{}_App_Callback", capitalize(name))
}

pub fn exhibition_callback_name(name: &str) -> String {
    format!("{}_Exhibition_Callback", capitalize(name))
}

/// Hands out names that never repeat.
///
/// The first request for a base name gets it unchanged; later requests get
/// the lowest free numeric suffix counting up from `_1`.
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as used without handing it out.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    pub fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let counter = self.next_suffix.entry(base.to_string()).or_insert(1);
        loop {
            let candidate = format!("{base}_{counter}");
            *counter += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Unique constructor function name of every non-root node, assigned in
/// postorder. `Create_Main_Menu` is reserved for the root.
pub fn function_names(tree: &MenuTree) -> HashMap<NodeId, String> {
    let Some(root) = tree.root() else {
        return HashMap::new();
    };
    let mut names = UniqueNames::new();
    names.reserve(MAIN_MENU_FUNCTION);
    tree.postorder(root)
        .into_iter()
        .filter(|id| *id != root)
        .map(|id| (id, names.claim(&base_function_name(&tree[id]))))
        .collect()
}

/// Unique global symbol of every node for the static layout, assigned in
/// postorder including the root.
pub fn static_symbols(tree: &MenuTree) -> HashMap<NodeId, String> {
    let Some(root) = tree.root() else {
        return HashMap::new();
    };
    let mut names = UniqueNames::new();
    names.reserve("g_menu_vars");
    tree.postorder(root)
        .into_iter()
        .map(|id| (id, names.claim(&base_static_symbol(&tree[id]))))
        .collect()
}
