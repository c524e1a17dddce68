use serde::Serialize;

use crate::aggregate::{LeadStats, StatsAccumulator, SubRegionEntry};

/// User-selected sub-regions and the hovered one.
///
/// Names are kept in selection order and are unique. The store knows nothing
/// about navigation, so moving between regions never clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionStore {
    selected: Vec<String>,
    hovered: Option<String>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }

    /// Selected names, oldest first.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Adds `name` if absent, removes it if present.
    ///
    /// Returns `true` if `name` is selected afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|s| s == name) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(name.to_string());
            true
        }
    }

    /// Returns `true` if the hovered name changed.
    pub fn set_hovered(&mut self, name: Option<&str>) -> bool {
        if self.hovered.as_deref() == name {
            return false;
        }
        self.hovered = name.map(str::to_string);
        true
    }

    pub fn clear_all(&mut self) {
        self.selected.clear();
        self.hovered = None;
    }

    /// Stats over the selected sub-regions present in `all`.
    ///
    /// `None` when nothing is selected or no selected name appears in `all`.
    pub fn aggregate_stats(&self, all: &[SubRegionEntry]) -> Option<LeadStats> {
        if self.selected.is_empty() {
            return None;
        }
        let mut acc = StatsAccumulator::default();
        for entry in all.iter().filter(|e| self.is_selected(e.name())) {
            acc.push(&entry.stats);
        }
        acc.finish()
    }
}
