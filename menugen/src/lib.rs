//! # menugen
//!
//! Code generator for menus running on the `menu_navigator.h` runtime.
//!
//! `menugen` reads a menu tree (see [`menukit`]) and emits a single C
//! source file that builds the same menu on the device, either through
//! constructor functions or as statically initialised structures. The
//! navigation simulator of `menukit` previews the result without hardware.
//!
//! ## Modules
//!
//! - [`codegen`] - C source generation in both layout styles
//! - [`ctx`] - Application context behind the CLI commands
//! - [`names`] - C identifier derivation and disambiguation
//! - [`settings`] - `menugen.toml` project settings
//! - [`utils`] - C literal formatting and placeholder expansion
//!
//! ## Example
//!
//! ```rust
//! use menugen::codegen::{GeneratorStyle, generate};
//! use menukit::data::{ItemKindTag, MenuConfig, MenuItem};
//!
//! let mut config = MenuConfig::new_file();
//! let root = config.tree.root().unwrap();
//! config.tree.add_item(Some(root), MenuItem::new("Reboot", ItemKindTag::Application)).unwrap();
//!
//! let source = generate(&config, GeneratorStyle::Dynamic);
//! assert!(source.contains("void Reboot_App_Callback(void** args)"));
//! assert!(source.contains("menu_create_app_item(\"Reboot\", NULL, Reboot_App_Callback);"));
//! ```

/// C source generation.
pub mod codegen;

/// Application context and state management.
pub mod ctx;

/// C identifier derivation.
pub mod names;

/// Project settings file.
pub mod settings;

/// Common utilities and helper functions.
pub mod utils;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;
