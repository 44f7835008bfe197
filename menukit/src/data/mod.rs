//! Menu tree model and persistence.
//!
//! This module provides the core data structures describing a menu:
//!
//! - Menu items and their kind-specific payloads
//! - The arena that owns every item and wires parents to children
//! - The top-level configuration with manual variable/callback overrides
//! - Text-driven property edits with local recovery
//!
//! ## Architecture
//!
//! - [`item`] - Individual menu items, kinds and data types
//! - [`tree`] - Arena storage, structural operations and repair
//! - [`config`] - `MenuConfig` container and JSON files
//! - [`edit`] - Property edits coming from text fields

/// Menu configuration container and JSON file handling.
pub mod config;

/// Text-driven property edits.
pub mod edit;

/// Individual menu item representation.
pub mod item;

/// Arena-backed menu tree.
pub mod tree;

use std::fmt;

pub use config::MenuConfig;
pub use edit::{EditField, EditOutcome, PropertyEdit};
pub use item::{
    ApplicationItem, ChangeableItem, DataType, ExhibitionItem, ItemKind, ItemKindTag, MenuItem,
    SimState, ToggleItem,
};
pub use tree::MenuTree;

/// Stable handle of a node inside a [`MenuTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena slot of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors raised while loading or restructuring a menu tree.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("missing field `{field}` at {path}")]
    MissingField { path: String, field: String },

    #[error("type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("unknown menu item type `{0}`")]
    UnknownKind(String),

    #[error("unknown data type `{0}`")]
    UnknownDataType(String),

    #[error("menu node {0} does not exist")]
    NoSuchNode(NodeId),

    #[error("moving {node} under {parent} would create a cycle")]
    WouldCycle { node: NodeId, parent: NodeId },
}
