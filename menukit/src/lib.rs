//! # menukit
//!
//! Menu tree model and on-device navigation simulator for firmware built on
//! the `menu_navigator` runtime.
//!
//! A menu is a rooted tree of [`data::MenuItem`]s stored in an arena
//! ([`data::MenuTree`]). The same tree feeds the C code generator in
//! `menugen` and the [`sim::NavigationSimulator`], which replays the
//! interactive behavior the generated firmware exhibits on real hardware.
//!
//! ## Quick Start
//!
//! ```rust
//! use menukit::data::{ItemKindTag, MenuConfig, MenuItem};
//! use menukit::sim::{Key, NavigationSimulator, SimulatorConfig};
//!
//! let mut config = MenuConfig::new_file();
//! let root = config.tree.root().unwrap();
//! config
//!     .tree
//!     .add_item(Some(root), MenuItem::new("Light", ItemKindTag::Toggle))
//!     .unwrap();
//!
//! let mut sim = NavigationSimulator::new(SimulatorConfig::default());
//! sim.start(&mut config.tree);
//! sim.handle_input(&mut config.tree, Key::Right);
//! sim.handle_input(&mut config.tree, Key::Up);
//! assert!(sim.render_text().starts_with(">>Light: ON"));
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Menu tree model, JSON persistence and property edits
//! - [`debounce`] - Quiet-period coalescing of rapid edits
//! - [`sim`] - Navigation simulator and its display configuration

#[macro_use]
extern crate log;

/// Menu tree model, JSON persistence and property edits.
pub mod data;

/// Quiet-period coalescing of rapid edits.
pub mod debounce;

/// Navigation simulator reproducing the firmware's input handling.
pub mod sim;

pub use serde_json::Value;
