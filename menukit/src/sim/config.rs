use std::fmt;

use serde::{Deserialize, Serialize};

/// Default width of a display line in characters.
pub const DEFAULT_MAX_DISPLAY_CHAR: usize = 20;
/// Default number of display lines.
pub const DEFAULT_MAX_DISPLAY_ITEM: usize = 8;
pub const DEFAULT_SELECT_CURSOR: &str = "->";
pub const DEFAULT_SUBMENU_INDICATOR: &str = ">>";

/// Display geometry and markers of the simulated device.
///
/// Mirrors the `MAX_DISPLAY_CHAR`, `MAX_DISPLAY_ITEM`, `MENU_SELECT_CURSOR`
/// and `MENU_HAS_SUBMENU_INDICATOR` macros of the firmware.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimulatorConfig {
    pub max_display_char: usize,
    pub max_display_item: usize,
    /// Marker of the selected line, exactly two characters.
    pub menu_select_cursor: String,
    /// Marker of an item in edit mode, exactly two characters.
    pub menu_has_submenu_indicator: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_display_char: DEFAULT_MAX_DISPLAY_CHAR,
            max_display_item: DEFAULT_MAX_DISPLAY_ITEM,
            menu_select_cursor: DEFAULT_SELECT_CURSOR.to_string(),
            menu_has_submenu_indicator: DEFAULT_SUBMENU_INDICATOR.to_string(),
        }
    }
}

/// Correction made while validating a [`SimulatorConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigNotice {
    /// A marker was not two characters long and was reset to its default.
    CursorReset {
        field: &'static str,
        rejected: String,
    },
    /// A size was not a positive integer; the previous value is kept.
    SizeRejected {
        field: &'static str,
        rejected: String,
    },
}

impl fmt::Display for ConfigNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigNotice::CursorReset { field, rejected } => write!(
                f,
                "{field} must be exactly two characters, `{rejected}` replaced by the default"
            ),
            ConfigNotice::SizeRejected { field, rejected } => write!(
                f,
                "{field} must be a positive integer, `{rejected}` ignored"
            ),
        }
    }
}

impl SimulatorConfig {
    /// Apply the validated-correction policy in place.
    ///
    /// Markers of the wrong length fall back to their defaults and zero
    /// sizes to the default geometry. Every correction is reported.
    pub fn validate(&mut self) -> Vec<ConfigNotice> {
        let mut notices = Vec::new();

        if self.menu_select_cursor.chars().count() != 2 {
            notices.push(ConfigNotice::CursorReset {
                field: "menu_select_cursor",
                rejected: std::mem::replace(
                    &mut self.menu_select_cursor,
                    DEFAULT_SELECT_CURSOR.to_string(),
                ),
            });
        }
        if self.menu_has_submenu_indicator.chars().count() != 2 {
            notices.push(ConfigNotice::CursorReset {
                field: "menu_has_submenu_indicator",
                rejected: std::mem::replace(
                    &mut self.menu_has_submenu_indicator,
                    DEFAULT_SUBMENU_INDICATOR.to_string(),
                ),
            });
        }
        if self.max_display_char == 0 {
            self.max_display_char = DEFAULT_MAX_DISPLAY_CHAR;
            notices.push(ConfigNotice::SizeRejected {
                field: "max_display_char",
                rejected: "0".into(),
            });
        }
        if self.max_display_item == 0 {
            self.max_display_item = DEFAULT_MAX_DISPLAY_ITEM;
            notices.push(ConfigNotice::SizeRejected {
                field: "max_display_item",
                rejected: "0".into(),
            });
        }

        for n in &notices {
            warn!("{n}");
        }
        notices
    }

    /// Build the configuration a draft describes, starting from `self`.
    ///
    /// A size that is not a positive integer rejects the whole draft and
    /// `self` is returned unchanged. Otherwise markers are validated as in
    /// [`Self::validate`].
    pub fn apply_draft(&self, draft: &SimulatorConfigDraft) -> (Self, Vec<ConfigNotice>) {
        let size = |field: &'static str, text: &str| match text.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigNotice::SizeRejected {
                field,
                rejected: text.to_string(),
            }),
        };

        let sizes = size("max_display_char", &draft.max_display_char).and_then(|c| {
            size("max_display_item", &draft.max_display_item).map(|i| (c, i))
        });
        let (max_display_char, max_display_item) = match sizes {
            Ok(s) => s,
            Err(notice) => {
                warn!("{notice}");
                return (self.clone(), vec![notice]);
            }
        };

        let mut next = SimulatorConfig {
            max_display_char,
            max_display_item,
            menu_select_cursor: draft.menu_select_cursor.clone(),
            menu_has_submenu_indicator: draft.menu_has_submenu_indicator.clone(),
        };
        let notices = next.validate();
        (next, notices)
    }
}

/// Unvalidated text form of a [`SimulatorConfig`], as typed by a user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimulatorConfigDraft {
    pub max_display_char: String,
    pub max_display_item: String,
    pub menu_select_cursor: String,
    pub menu_has_submenu_indicator: String,
}

impl From<&SimulatorConfig> for SimulatorConfigDraft {
    fn from(config: &SimulatorConfig) -> Self {
        Self {
            max_display_char: config.max_display_char.to_string(),
            max_display_item: config.max_display_item.to_string(),
            menu_select_cursor: config.menu_select_cursor.clone(),
            menu_has_submenu_indicator: config.menu_has_submenu_indicator.clone(),
        }
    }
}
