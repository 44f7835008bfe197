//! C source generation for the `menu_navigator.h` runtime.
//!
//! [`generate`] turns a [`MenuConfig`] into one C translation unit. Both
//! layout styles share the same preamble:
//!
//! - `#include` lines
//! - `menu_variables_t` and its `g_menu_vars` instance, built from the
//!   [`VariablePool`]
//! - callback stubs from the [`CallbackPool`], with bodies supplied by the
//!   configuration where names match
//!
//! followed by the style-specific menu layout and the `getMainItem` entry
//! point.
//!
//! ## Styles
//!
//! - [`GeneratorStyle::Dynamic`] - one constructor function per node,
//!   children defined before their parent
//! - [`GeneratorStyle::Static`] - one global `menu_item_t` per node with
//!   explicit parent and children pointers

/// Function-per-node layout.
pub mod dynamic;

/// Variable and callback pools.
pub mod pool;

/// Global struct layout.
pub mod static_layout;

use std::{fmt, str::FromStr};

use clap::ValueEnum;
use menukit::data::MenuConfig;
use serde::{Deserialize, Serialize};

pub use pool::{CallbackPool, CallbackSignature, PooledVariable, VariablePool};

use crate::{
    names::{MAIN_MENU_FUNCTION, sanitize},
    utils::indent,
};

/// Output of [`generate`] for a configuration without a root.
pub const NO_ROOT_COMMENT: &str = "// no root menu item found\n";

const INDENT: &str = "    ";

/// Layout strategy of the generated menu.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorStyle {
    /// `Create_*_Menu` constructor functions.
    #[default]
    Dynamic,
    /// Statically initialised `menu_item_t` globals.
    Static,
}

impl GeneratorStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            GeneratorStyle::Dynamic => "dynamic",
            GeneratorStyle::Static => "static",
        }
    }
}

impl fmt::Display for GeneratorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dynamic" => Ok(GeneratorStyle::Dynamic),
            "static" => Ok(GeneratorStyle::Static),
            _ => Err(anyhow!("unknown generator style `{s}`")),
        }
    }
}

/// Line buffer for generated C.
#[derive(Debug, Default)]
pub(crate) struct Emitter {
    lines: Vec<String>,
}

impl Emitter {
    pub(crate) fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// One line indented by `depth` levels.
    pub(crate) fn indented(&mut self, depth: usize, line: impl AsRef<str>) {
        self.lines
            .push(format!("{}{}", INDENT.repeat(depth), line.as_ref()));
    }

    pub(crate) fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn section(&mut self, title: &str) {
        self.line(format!("// ==================== {title} ===================="));
    }

    fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Render `config` as C source in the given style.
///
/// Never fails: a configuration without a root yields
/// [`NO_ROOT_COMMENT`].
///
/// ```rust
/// use menugen::codegen::{GeneratorStyle, NO_ROOT_COMMENT, generate};
/// use menukit::data::MenuConfig;
///
/// assert_eq!(generate(&MenuConfig::new(), GeneratorStyle::Dynamic), NO_ROOT_COMMENT);
///
/// let src = generate(&MenuConfig::new_file(), GeneratorStyle::Static);
/// assert!(src.contains("static menu_item_t menu_main;"));
/// assert!(src.contains("void* getMainItem(void)"));
/// ```
pub fn generate(config: &MenuConfig, style: GeneratorStyle) -> String {
    let Some(root) = config.tree.root() else {
        debug!("no root item, emitting placeholder");
        return NO_ROOT_COMMENT.to_string();
    };

    let variables = VariablePool::collect(config);
    let callbacks = CallbackPool::collect(&config.tree);
    debug!(
        "generating {style} layout for {} items",
        config.tree.postorder(root).len()
    );

    let mut out = Emitter::default();
    emit_includes(&mut out, style);
    emit_variables(&mut out, &variables);
    emit_callbacks(&mut out, &callbacks, config);

    match style {
        GeneratorStyle::Dynamic => dynamic::emit_menu(&mut out, &config.tree, root),
        GeneratorStyle::Static => static_layout::emit_menu(&mut out, &config.tree, root),
    }

    out.section("entry point");
    out.line("void* getMainItem(void) {");
    out.indented(1, format!("return {MAIN_MENU_FUNCTION}();"));
    out.line("}");
    out.finish()
}

fn emit_includes(out: &mut Emitter, style: GeneratorStyle) {
    out.line("// Generated by menugen. Edits to menu structure belong in the menu file.");
    out.line("#include \"menu_navigator.h\"");
    if style == GeneratorStyle::Static {
        out.line("#include \"menu_wrapper.h\"");
    }
    out.line("#include <stdint.h>");
    out.line("#include <stdio.h>");
    out.blank();
}

fn emit_variables(out: &mut Emitter, variables: &VariablePool) {
    out.section("variables");
    if variables.is_empty() {
        out.line("// no variable definitions");
        out.blank();
        return;
    }

    out.line("typedef struct {");
    for (name, var) in variables.iter() {
        out.indented(1, format!("{} {name};", var.data_type.c_type()));
    }
    out.line("} menu_variables_t;");
    out.blank();

    out.line("static menu_variables_t g_menu_vars = {");
    for (name, var) in variables.iter() {
        out.indented(1, format!(".{name} = {},", var.literal()));
    }
    out.line("};");
    out.blank();
}

fn emit_callbacks(out: &mut Emitter, callbacks: &CallbackPool, config: &MenuConfig) {
    out.section("callbacks");
    if callbacks.is_empty() {
        out.line("// no callback functions");
        out.blank();
    }

    for (name, signature) in callbacks.iter() {
        out.line(format!("void {name}({}) {{", signature.params()));
        match config.callbacks.get(name) {
            Some(code) => out.line(indent(code, INDENT)),
            None => emit_stub_body(out, signature),
        }
        out.line("}");
        out.blank();
    }

    let mut user_code = config
        .callbacks
        .iter()
        .filter(|(name, _)| !callbacks.contains(name))
        .peekable();
    if user_code.peek().is_some() {
        out.section("user code");
        for (name, code) in user_code {
            out.line(format!("void {}(void) {{", sanitize(name)));
            out.line(indent(code, INDENT));
            out.line("}");
            out.blank();
        }
    }
}

/// Lines written per page by the exhibition placeholder.
const PLACEHOLDER_LINES: u16 = 3;

fn emit_stub_body(out: &mut Emitter, signature: CallbackSignature) {
    match signature {
        CallbackSignature::Toggle => out.indented(1, "/* TODO: react to the new state */"),
        CallbackSignature::Change => out.indented(1, "/* TODO: react to the new value */"),
        CallbackSignature::App => out.indented(1, "/* TODO: run the application */"),
        CallbackSignature::Exhibition { total_pages: 1 } => {
            out.indented(1, "char buffer[MAX_DISPLAY_CHAR];");
            out.indented(1, "/* TODO: fill the display */");
            emit_placeholder_lines(out, 1, 0);
        }
        CallbackSignature::Exhibition { total_pages } => {
            out.indented(1, "char buffer[MAX_DISPLAY_CHAR];");
            out.indented(1, "switch(current_page)");
            out.indented(1, "{");
            for page in 0..u16::from(total_pages) {
                out.indented(2, format!("case {page}:"));
                out.indented(3, format!("/* TODO: fill page {} */", page + 1));
                emit_placeholder_lines(out, 3, page);
                out.indented(3, "break;");
            }
            out.indented(1, "}");
        }
    }
}

fn emit_placeholder_lines(out: &mut Emitter, depth: usize, page: u16) {
    for line in 0..PLACEHOLDER_LINES {
        let n = page * PLACEHOLDER_LINES + line + 1;
        out.indented(
            depth,
            format!("snprintf(buffer, sizeof(buffer), \"data{n}\");"),
        );
        out.indented(
            depth,
            format!("navigator_write_display_line(nav, buffer, {});", line + 1),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menukit::data::{ExhibitionItem, ItemKind, ItemKindTag, MenuItem};

    fn with_exhibition(pages: u32) -> MenuConfig {
        let mut config = MenuConfig::new_file();
        let root = config.tree.root().unwrap();
        config
            .tree
            .add_item(
                Some(root),
                MenuItem::with_kind("Status", ItemKind::Exhibition(ExhibitionItem::new(pages))),
            )
            .unwrap();
        config
    }

    #[test]
    fn test_style_parse() {
        assert_eq!("static".parse::<GeneratorStyle>().unwrap(), GeneratorStyle::Static);
        assert_eq!("Dynamic".parse::<GeneratorStyle>().unwrap(), GeneratorStyle::Dynamic);
        assert!("fancy".parse::<GeneratorStyle>().is_err());
        assert_eq!(GeneratorStyle::default(), GeneratorStyle::Dynamic);
    }

    #[test]
    fn test_empty_pools_are_commented() {
        let src = generate(&MenuConfig::new_file(), GeneratorStyle::Dynamic);
        assert!(src.contains("// no variable definitions"));
        assert!(src.contains("// no callback functions"));
        assert!(!src.contains("menu_variables_t"));
    }

    #[test]
    fn test_single_page_exhibition_stub() {
        let src = generate(&with_exhibition(1), GeneratorStyle::Dynamic);
        assert!(src.contains("void Status_Exhibition_Callback(navigator_t* nav) {"));
        assert!(src.contains("    navigator_write_display_line(nav, buffer, 3);"));
        assert!(!src.contains("switch(current_page)"));
    }

    #[test]
    fn test_paged_exhibition_stub() {
        let src = generate(&with_exhibition(2), GeneratorStyle::Dynamic);
        assert!(src.contains(
            "void Status_Exhibition_Callback(navigator_t* nav, uint8_t current_page, uint8_t total_pages) {"
        ));
        assert!(src.contains("        case 0:\n            /* TODO: fill page 1 */"));
        assert!(src.contains("        case 1:"));
        assert!(!src.contains("case 2:"));
        assert!(src.contains("\"data6\""));
        assert_eq!(src.matches("break;").count(), 2);
    }

    #[test]
    fn test_config_callbacks() {
        let mut config = MenuConfig::new_file();
        let root = config.tree.root().unwrap();
        config
            .tree
            .add_item(Some(root), MenuItem::new("Reboot", ItemKindTag::Application))
            .unwrap();
        config.add_callback("Reboot_App_Callback", "system_reset();");
        config.add_callback("on idle", "sleep();\nwake();");

        let src = generate(&config, GeneratorStyle::Dynamic);
        assert!(src.contains("void Reboot_App_Callback(void** args) {\n    system_reset();\n}"));
        assert!(!src.contains("run the application"));
        assert!(src.contains("// ==================== user code"));
        assert!(src.contains("void on_idle(void) {\n    sleep();\n    wake();\n}"));
    }

    #[test]
    fn test_static_includes_wrapper() {
        let dynamic = generate(&MenuConfig::new_file(), GeneratorStyle::Dynamic);
        let stat = generate(&MenuConfig::new_file(), GeneratorStyle::Static);
        assert!(!dynamic.contains("menu_wrapper.h"));
        assert!(stat.contains("#include \"menu_navigator.h\"\n#include \"menu_wrapper.h\""));
    }
}
