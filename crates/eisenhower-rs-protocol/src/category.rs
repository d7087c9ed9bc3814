//! Matrix quadrants and the fixed presets offered by menus.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four Eisenhower quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Important and urgent.
    DoFirst,
    /// Important, not urgent.
    Schedule,
    /// Urgent, not important.
    Delegate,
    /// Neither important nor urgent.
    Eliminate,
}

impl Category {
    /// All quadrants in display order.
    pub const ALL: [Category; 4] = [
        Category::DoFirst,
        Category::Schedule,
        Category::Delegate,
        Category::Eliminate,
    ];

    /// Human readable quadrant name.
    pub fn name(self) -> &'static str {
        match self {
            Category::DoFirst => "Do First",
            Category::Schedule => "Schedule",
            Category::Delegate => "Delegate",
            Category::Eliminate => "Eliminate",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::DoFirst => "🔴",
            Category::Schedule => "🟡",
            Category::Delegate => "🔵",
            Category::Eliminate => "🟢",
        }
    }

    /// Short guidance shown next to the quadrant name.
    pub fn description(self) -> &'static str {
        match self {
            Category::DoFirst => "important & urgent",
            Category::Schedule => "important, not urgent",
            Category::Delegate => "urgent, not important",
            Category::Eliminate => "neither important nor urgent",
        }
    }

    /// Icon and name, e.g. "🔴 Do First".
    pub fn label(self) -> String {
        format!("{} {}", self.icon(), self.name())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed (importance, urgency) pairs bound to the context menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    DoFirst,
    Schedule,
    Delegate,
    Eliminate,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::DoFirst,
        Preset::Schedule,
        Preset::Delegate,
        Preset::Eliminate,
    ];

    /// The (importance, urgency) pair this preset stands for.
    pub fn levels(self) -> (i32, i32) {
        match self {
            Preset::DoFirst => (4, 4),
            Preset::Schedule => (4, 2),
            Preset::Delegate => (2, 4),
            Preset::Eliminate => (2, 2),
        }
    }

    /// Context menu item id.
    pub fn menu_id(self) -> &'static str {
        match self {
            Preset::DoFirst => "matrix-do-first",
            Preset::Schedule => "matrix-schedule",
            Preset::Delegate => "matrix-delegate",
            Preset::Eliminate => "matrix-eliminate",
        }
    }

    /// Resolve a context menu item id back to its preset.
    pub fn from_menu_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.menu_id() == id)
    }

    /// Quadrant a preset lands in.
    pub fn category(self) -> Category {
        match self {
            Preset::DoFirst => Category::DoFirst,
            Preset::Schedule => Category::Schedule,
            Preset::Delegate => Category::Delegate,
            Preset::Eliminate => Category::Eliminate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, Preset};
    use pretty_assertions::assert_eq;

    #[test]
    fn menu_ids_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(Preset::from_menu_id(preset.menu_id()), Some(preset));
        }
        assert_eq!(Preset::from_menu_id("open-popup"), None);
    }

    #[test]
    fn label_combines_icon_and_name() {
        assert_eq!(Category::Delegate.label(), "🔵 Delegate");
    }
}
