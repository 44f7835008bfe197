//! Application context and state management.
//!
//! This module provides the [`AppContext`] type which holds the state of a
//! `menugen` invocation: the workspace folder, the loaded `menugen.toml`
//! settings, and the operations behind every CLI command.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use colored::Colorize;
use menukit::{
    data::{ItemKind, MenuConfig, MenuTree, NodeId},
    sim::{Key, NavigationSimulator},
};

use crate::{
    codegen::{self, GeneratorStyle},
    settings::{SETTINGS_FILE, Settings},
    utils::replace_env_placeholders,
};

/// Path configuration grouping all path-related fields.
#[derive(Default, Clone)]
pub struct PathConfig {
    /// Folder `${workspaceFolder}` expands to.
    pub workspace: PathBuf,
    /// Settings file that was looked up.
    pub settings: PathBuf,
}

/// The main application context holding all state.
#[derive(Default, Clone)]
pub struct AppContext {
    pub paths: PathConfig,
    pub settings: Settings,
}

impl AppContext {
    /// Creates a context rooted at `workspace`.
    ///
    /// # Arguments
    ///
    /// * `workspace` - Folder used for `${workspaceFolder}` and relative paths.
    /// * `settings_path` - Settings file; defaults to `menugen.toml` in the
    ///   workspace. A missing file yields default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file exists but cannot be parsed.
    pub fn new(workspace: PathBuf, settings_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let settings_path = settings_path.unwrap_or_else(|| workspace.join(SETTINGS_FILE));
        let (settings, notices) = Settings::load(&settings_path)?;
        for notice in notices {
            println!("{}", format!("note: {notice}").yellow());
        }
        Ok(Self {
            paths: PathConfig {
                workspace,
                settings: settings_path,
            },
            settings,
        })
    }

    /// Replaces variable placeholders in a string.
    ///
    /// Supports `${workspaceFolder}` and `${env:VAR}`.
    pub fn value_replace_with_var<S>(&self, value: S) -> String
    where
        S: AsRef<std::ffi::OsStr>,
    {
        let raw = value.as_ref().to_string_lossy();
        let expanded = replace_env_placeholders(&raw);
        expanded.replace(
            "${workspaceFolder}",
            format!("{}", self.paths.workspace.display()).as_ref(),
        )
    }

    /// Resolves where generated code goes: the CLI path, else the settings
    /// `output`, else stdout (`None`).
    pub fn output_path(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| {
            self.settings
                .generator
                .output
                .as_ref()
                .map(|o| PathBuf::from(self.value_replace_with_var(o)))
        })
    }

    /// Writes a fresh menu file with a `Main` root.
    ///
    /// A default `menugen.toml` is written next to it when the workspace has
    /// none.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` already exists or cannot be written.
    pub fn new_menu_file(&self, path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        MenuConfig::new_file().save(path)?;
        println!(
            "{}",
            format!("Created menu file {}", path.display()).bold().purple()
        );

        if !self.paths.settings.exists() {
            self.settings.save(&self.paths.settings)?;
            println!(
                "{}",
                format!("Created settings {}", self.paths.settings.display())
                    .bold()
                    .purple()
            );
        }
        Ok(())
    }

    /// Generates C source from a menu file.
    ///
    /// # Arguments
    ///
    /// * `input` - Menu JSON file.
    /// * `style` - Layout style; falls back to the settings.
    /// * `output` - Destination; falls back to the settings, then stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the menu cannot be loaded or the output written.
    pub fn generate(
        &self,
        input: &Path,
        style: Option<GeneratorStyle>,
        output: Option<PathBuf>,
    ) -> anyhow::Result<()> {
        let config = MenuConfig::load(input)?;
        let style = style.unwrap_or(self.settings.generator.style);
        let source = codegen::generate(&config, style);

        match self.output_path(output) {
            Some(out) => {
                if let Some(parent) = out.parent()
                    && !parent.as_os_str().is_empty()
                {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&out, &source)
                    .with_context(|| format!("can not write {}", out.display()))?;
                println!(
                    "{}",
                    format!(
                        "Generated {style} menu source\r\n  menu: {}\r\n  out:  {}",
                        input.display(),
                        out.display()
                    )
                    .bold()
                    .purple()
                );
            }
            None => print!("{source}"),
        }
        Ok(())
    }

    /// Replays a key script against a menu file and prints the display.
    ///
    /// # Errors
    ///
    /// Returns an error if the menu cannot be loaded or the script contains
    /// an unknown key.
    pub fn simulate(&self, input: &Path, script: &str, trace: bool) -> anyhow::Result<()> {
        let mut config = MenuConfig::load(input)?;
        let transcript = self.simulate_script(&mut config, script, trace)?;
        print!("{transcript}");
        Ok(())
    }

    /// Runs `script` on a fresh session over `config` and returns the
    /// rendered frames: every step with `trace`, else the final one.
    ///
    /// # Errors
    ///
    /// Returns an error if the script contains an unknown key.
    pub fn simulate_script(
        &self,
        config: &mut MenuConfig,
        script: &str,
        trace: bool,
    ) -> anyhow::Result<String> {
        let keys = Key::parse_script(script).map_err(|e| anyhow!(e))?;
        let tree = &mut config.tree;

        let mut sim = NavigationSimulator::new(self.settings.simulator.clone());
        sim.start(tree);

        let mut transcript = String::new();
        if trace || keys.is_empty() {
            transcript.push_str(&frame("start", &sim, tree));
        }
        for (i, key) in keys.iter().enumerate() {
            sim.handle_input(tree, *key);
            if trace || i + 1 == keys.len() {
                transcript.push_str(&frame(&key.to_string(), &sim, tree));
            }
        }
        Ok(transcript)
    }

    /// Prints the menu tree of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the menu cannot be loaded.
    pub fn print_tree(&self, input: &Path) -> anyhow::Result<()> {
        let config = MenuConfig::load(input)?;
        print!("{}", tree_report(&config.tree));
        Ok(())
    }
}

fn frame(label: &str, sim: &NavigationSimulator, tree: &MenuTree) -> String {
    let width = sim.config().max_display_char;
    let border = format!("+{}+", "-".repeat(width));
    let mut out = format!("> {label} [{}]\n{border}\n", sim.current_path(tree).join("/"));
    for line in sim.display() {
        out.push_str(&format!("|{line}|\n"));
    }
    out.push_str(&border);
    out.push('\n');
    out
}

/// One line per node, indented by depth, with its kind and key fields.
pub fn tree_report(tree: &MenuTree) -> String {
    let mut out = String::new();
    if let Some(root) = tree.root() {
        report_node(tree, root, 0, &mut out);
    } else {
        out.push_str("(empty menu)\n");
    }
    out
}

fn report_node(tree: &MenuTree, id: NodeId, depth: usize, out: &mut String) {
    let item = &tree[id];
    let detail = match &item.kind {
        ItemKind::Normal => String::new(),
        ItemKind::Toggle(t) => format!(" var={} state={}", t.variable_name, t.state),
        ItemKind::Changeable(c) => format!(
            " var={} {} [{}, {}] step {}",
            c.variable_name,
            c.data_type(),
            c.min_val(),
            c.max_val(),
            c.step_val()
        ),
        ItemKind::Application(_) => String::new(),
        ItemKind::Exhibition(e) => format!(" pages={}", e.total_pages()),
    };
    out.push_str(&format!(
        "{}{} [{}]{detail}\n",
        "  ".repeat(depth),
        item.name,
        item.tag()
    ));
    for child in item.children() {
        report_node(tree, *child, depth + 1, out);
    }
}
