//! Navigation simulator.
//!
//! [`NavigationSimulator`] replays the input handling of the firmware's
//! menu navigator against a [`MenuTree`]: selection with a scrolling
//! window, edit mode for Toggle/Changeable items, pagination of Exhibition
//! items and descending into submenus. The display is a fixed buffer of
//! fixed-width lines, like the device's character display.

mod config;

use std::{fmt, str::FromStr, time::Instant};

pub use config::{
    ConfigNotice, DEFAULT_MAX_DISPLAY_CHAR, DEFAULT_MAX_DISPLAY_ITEM, DEFAULT_SELECT_CURSOR,
    DEFAULT_SUBMENU_INDICATOR, SimulatorConfig, SimulatorConfigDraft,
};

use crate::{
    data::{ItemKind, ItemKindTag, MenuItem, MenuTree, NodeId},
    debounce::Debouncer,
};

/// Navigation key of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Map the letters `U D L R` (any case) to keys.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'U' => Some(Key::Up),
            'D' => Some(Key::Down),
            'L' => Some(Key::Left),
            'R' => Some(Key::Right),
            _ => None,
        }
    }

    /// Parse a key script such as `"RRDUL"`; whitespace is ignored.
    pub fn parse_script(script: &str) -> Result<Vec<Key>, String> {
        script
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| {
                Key::from_char(c).ok_or_else(|| format!("invalid key `{c}`, expected U, D, L or R"))
            })
            .collect()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Key::Up => "UP",
            Key::Down => "DOWN",
            Key::Left => "LEFT",
            Key::Right => "RIGHT",
        })
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UP" | "U" => Ok(Key::Up),
            "DOWN" | "D" => Ok(Key::Down),
            "LEFT" | "L" => Ok(Key::Left),
            "RIGHT" | "R" => Ok(Key::Right),
            other => Err(format!("unknown key `{other}`")),
        }
    }
}

/// State machine of the on-device menu navigator.
///
/// The simulator does not own the tree; every call takes it explicitly so
/// the same tree can be edited between steps.
#[derive(Debug)]
pub struct NavigationSimulator {
    config: SimulatorConfig,
    current_menu: Option<NodeId>,
    selected_index: usize,
    first_visible_item: usize,
    in_app_mode: bool,
    display: Vec<String>,
    pending_config: Debouncer<SimulatorConfigDraft>,
}

impl NavigationSimulator {
    /// Create an idle simulator; the configuration is validated first.
    pub fn new(mut config: SimulatorConfig) -> Self {
        config.validate();
        let display = blank_buffer(&config);
        Self {
            config,
            current_menu: None,
            selected_index: 0,
            first_visible_item: 0,
            in_app_mode: false,
            display,
            pending_config: Debouncer::default(),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn current_menu(&self) -> Option<NodeId> {
        self.current_menu
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn first_visible_item(&self) -> usize {
        self.first_visible_item
    }

    pub fn in_app_mode(&self) -> bool {
        self.in_app_mode
    }

    /// Current display buffer, one fixed-width string per line.
    pub fn display(&self) -> &[String] {
        &self.display
    }

    /// Display buffer joined with newlines.
    pub fn render_text(&self) -> String {
        self.display.join("\n")
    }

    /// Begin a session on `tree`: reset the transient state of every node
    /// and show the root's children.
    pub fn start(&mut self, tree: &mut MenuTree) {
        self.current_menu = None;
        self.selected_index = 0;
        self.first_visible_item = 0;
        self.in_app_mode = false;

        if let Some(root) = tree.root() {
            for id in tree.preorder(root) {
                reset_item(&mut tree[id]);
            }
            self.current_menu = Some(root);
        }
        debug!("simulation started, {} items", tree.len());
        self.refresh(tree);
    }

    /// Enter or leave application mode, like `navigator_set_app_mode`.
    pub fn set_app_mode(&mut self, tree: &MenuTree, in_app_mode: bool) {
        self.in_app_mode = in_app_mode;
        self.refresh(tree);
    }

    /// Replace the configuration immediately.
    pub fn set_config(
        &mut self,
        tree: &MenuTree,
        mut config: SimulatorConfig,
    ) -> Vec<ConfigNotice> {
        let notices = config.validate();
        self.config = config;
        self.refresh(tree);
        notices
    }

    /// Queue a typed configuration; it is applied by [`Self::poll_config`]
    /// once no newer draft arrived for the quiet period.
    pub fn submit_config_draft(&mut self, draft: SimulatorConfigDraft, now: Instant) {
        self.pending_config.submit_at(draft, now);
    }

    /// Apply a queued draft whose quiet period has elapsed.
    ///
    /// Returns `None` when nothing was applied.
    pub fn poll_config(&mut self, tree: &MenuTree, now: Instant) -> Option<Vec<ConfigNotice>> {
        let draft = self.pending_config.poll(now)?;
        Some(self.apply_draft(tree, &draft))
    }

    /// Apply any queued draft right away.
    pub fn flush_config(&mut self, tree: &MenuTree) -> Option<Vec<ConfigNotice>> {
        let draft = self.pending_config.flush()?;
        Some(self.apply_draft(tree, &draft))
    }

    fn apply_draft(&mut self, tree: &MenuTree, draft: &SimulatorConfigDraft) -> Vec<ConfigNotice> {
        let (config, notices) = self.config.apply_draft(draft);
        self.config = config;
        self.refresh(tree);
        notices
    }

    /// Names from the root to the menu currently shown.
    pub fn current_path<'a>(&self, tree: &'a MenuTree) -> Vec<&'a str> {
        self.current_menu.map(|m| tree.path(m)).unwrap_or_default()
    }

    /// The child under the cursor, if any.
    pub fn selected_item(&self, tree: &MenuTree) -> Option<NodeId> {
        let menu = tree.get(self.current_menu?)?;
        menu.children().get(self.selected_index).copied()
    }

    /// Process one key press and redraw.
    pub fn handle_input(&mut self, tree: &mut MenuTree, key: Key) {
        let Some(menu) = self.current_menu.filter(|m| tree.contains(*m)) else {
            return;
        };
        let len = tree[menu].children().len();
        if len == 0 {
            return;
        }

        if self.in_app_mode {
            if key == Key::Left {
                self.in_app_mode = false;
                self.refresh(tree);
            }
            return;
        }

        if self.selected_index >= len {
            self.selected_index = len - 1;
        }
        let selected = tree[menu].children()[self.selected_index];
        trace!("{key} on `{}`", tree[selected].name);

        match key {
            Key::Up | Key::Down => self.handle_vertical(tree, selected, key, len),
            Key::Right => self.handle_right(tree, menu, selected),
            Key::Left => self.handle_left(tree, selected),
        }
        self.refresh(tree);
    }

    fn handle_vertical(&mut self, tree: &mut MenuTree, selected: NodeId, key: Key, len: usize) {
        let item = &mut tree[selected];
        if item.sim.is_locked {
            self.move_selection(key, len);
            return;
        }
        let up = key == Key::Up;
        match &mut item.kind {
            ItemKind::Toggle(t) => t.state = !t.state,
            ItemKind::Changeable(c) => {
                if up {
                    c.increment()
                } else {
                    c.decrement()
                }
            }
            ItemKind::Exhibition(e) => {
                let total = u16::from(e.total_pages().max(1));
                let page = u16::from(item.sim.current_page) % total;
                let next = if up {
                    (page + total - 1) % total
                } else {
                    (page + 1) % total
                };
                item.sim.current_page = next as u8;
            }
            ItemKind::Normal | ItemKind::Application(_) => self.move_selection(key, len),
        }
    }

    fn handle_right(&mut self, tree: &mut MenuTree, menu: NodeId, selected: NodeId) {
        match tree[selected].tag() {
            ItemKindTag::Application => {}
            ItemKindTag::Exhibition => {
                let item = &mut tree[selected];
                if item.sim.is_locked {
                    item.sim.is_locked = false;
                    item.sim.current_page = 0;
                    item.sim.saved_first_visible_item_before_exhibition = self.first_visible_item;
                    self.first_visible_item = self.selected_index;
                }
            }
            ItemKindTag::Toggle | ItemKindTag::Changeable => {
                tree[selected].sim.is_locked = false;
            }
            ItemKindTag::Normal => {
                if tree[selected].children().is_empty() {
                    return;
                }
                let parent = &mut tree[menu].sim;
                parent.saved_selected_index = self.selected_index;
                parent.saved_first_visible_item = self.first_visible_item;
                self.current_menu = Some(selected);
                self.selected_index = 0;
                self.first_visible_item = 0;
            }
        }
    }

    fn handle_left(&mut self, tree: &mut MenuTree, selected: NodeId) {
        let item = &mut tree[selected];
        let editable = matches!(
            item.kind,
            ItemKind::Toggle(_) | ItemKind::Changeable(_) | ItemKind::Exhibition(_)
        );
        if editable && !item.sim.is_locked {
            item.sim.is_locked = true;
            if let ItemKind::Exhibition(_) = item.kind {
                self.first_visible_item = item.sim.saved_first_visible_item_before_exhibition;
            }
            return;
        }
        self.ascend(tree);
    }

    fn ascend(&mut self, tree: &MenuTree) {
        let Some(parent) = self.current_menu.and_then(|m| tree.get(m)).and_then(MenuItem::parent)
        else {
            return;
        };
        self.current_menu = Some(parent);
        self.selected_index = tree[parent].sim.saved_selected_index;
        self.first_visible_item = tree[parent].sim.saved_first_visible_item;
    }

    fn move_selection(&mut self, key: Key, len: usize) {
        self.selected_index = match key {
            Key::Up => (self.selected_index + len - 1) % len,
            _ => (self.selected_index + 1) % len,
        };
        self.adjust_visible_range(len);
    }

    fn adjust_visible_range(&mut self, len: usize) {
        let max = self.config.max_display_item;
        if len <= max {
            return;
        }
        if self.selected_index >= self.first_visible_item + max {
            self.first_visible_item += max;
        } else if self.selected_index < self.first_visible_item {
            self.first_visible_item = (self.selected_index + 1).saturating_sub(max);
        }
    }

    /// Redraw the display buffer from the current state.
    pub fn refresh(&mut self, tree: &MenuTree) {
        self.display = blank_buffer(&self.config);
        if self.in_app_mode {
            return;
        }
        let Some(menu) = self.current_menu.and_then(|m| tree.get(m)) else {
            return;
        };
        let children = menu.children();
        if children.is_empty() {
            return;
        }
        let selected_index = self.selected_index.min(children.len() - 1);
        let selected = &tree[children[selected_index]];

        if matches!(selected.kind, ItemKind::Exhibition(_)) && !selected.sim.is_locked {
            let line = self.format_item(selected, &self.config.menu_has_submenu_indicator);
            if let Some(first) = self.display.first_mut() {
                *first = line;
            }
            return;
        }

        let visible = children
            .iter()
            .enumerate()
            .skip(self.first_visible_item)
            .take(self.config.max_display_item);
        for (row, (index, child)) in visible.enumerate() {
            let indicator = if index == selected_index {
                self.config.menu_select_cursor.as_str()
            } else {
                "  "
            };
            let line = self.format_item(&tree[child], indicator);
            self.display[row] = line;
        }
    }

    fn format_item(&self, item: &MenuItem, indicator: &str) -> String {
        let edit = self.config.menu_has_submenu_indicator.as_str();
        let text = match &item.kind {
            ItemKind::Normal | ItemKind::Application(_) => format!("{indicator}{}", item.name),
            ItemKind::Exhibition(_) if item.sim.is_locked => format!("{indicator}{}", item.name),
            ItemKind::Exhibition(e) => {
                if e.total_pages() > 1 {
                    format!(
                        "{edit}{}({}/{}):",
                        item.name,
                        item.sim.current_page as u32 + 1,
                        e.total_pages()
                    )
                } else {
                    format!("{edit}{}:", item.name)
                }
            }
            ItemKind::Toggle(t) => {
                let marker = if item.sim.is_locked { indicator } else { edit };
                let state = if t.state { "ON" } else { "OFF" };
                format!("{marker}{}: {state}", item.name)
            }
            ItemKind::Changeable(c) => {
                let marker = if item.sim.is_locked { indicator } else { edit };
                let value = if c.data_type().is_float() {
                    format!("{:.2}", c.current_val())
                } else {
                    format!("{}", c.current_val().trunc() as i64)
                };
                format!("{marker}{}: {value}", item.name)
            }
        };
        fit_width(&text, self.config.max_display_char)
    }
}

impl Default for NavigationSimulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

fn reset_item(item: &mut MenuItem) {
    item.sim = Default::default();
    if let ItemKind::Changeable(c) = &mut item.kind {
        c.reset_current_val();
    }
}

fn blank_buffer(config: &SimulatorConfig) -> Vec<String> {
    vec![" ".repeat(config.max_display_char); config.max_display_item]
}

/// Truncate or right-pad `text` to exactly `width` characters.
pub fn fit_width(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width - len));
    out
}
