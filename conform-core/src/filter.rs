//! Filtered view and multi-selection over a run's results.
//!
//! All four filter dimensions compose conjunctively: a result is shown only
//! when it passes the status, division, system-type, and search predicates.

use std::collections::HashSet;

use crate::types::{ConformanceResult, OverallStatus};

/// Sentinel option value meaning "no restriction" for division and system type.
pub const ANY: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConformanceFilters {
    /// Empty means every status.
    pub status: Vec<OverallStatus>,
    pub division: String,
    pub system_type: String,
    pub search_query: String,
}

fn unrestricted(value: &str) -> bool {
    value.is_empty() || value == ANY
}

impl ConformanceFilters {
    pub fn matches(&self, result: &ConformanceResult) -> bool {
        if !self.status.is_empty() && !self.status.contains(&result.overall_status) {
            return false;
        }
        if !unrestricted(&self.division) && result.division != self.division {
            return false;
        }
        if !unrestricted(&self.system_type) && result.system_type != self.system_type {
            return false;
        }
        if !self.search_query.is_empty() {
            let query = self.search_query.to_lowercase();
            if !result.material_description.to_lowercase().contains(&query)
                && !result.spec_section.to_lowercase().contains(&query)
            {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, results: &'a [ConformanceResult]) -> Vec<&'a ConformanceResult> {
        results.iter().filter(|r| self.matches(r)).collect()
    }

    /// Adds `status` to the status filter, or removes it if already present.
    pub fn toggle_status(&mut self, status: OverallStatus) {
        if let Some(pos) = self.status.iter().position(|s| *s == status) {
            self.status.remove(pos);
        } else {
            self.status.push(status);
        }
    }

    pub fn has_active_filters(&self) -> bool {
        !self.status.is_empty()
            || !unrestricted(&self.division)
            || !unrestricted(&self.system_type)
            || !self.search_query.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Advances `current` through `["", options...]`, wrapping back to "any".
pub fn cycle_option(current: &str, options: &[String]) -> String {
    if unrestricted(current) {
        return options.first().cloned().unwrap_or_default();
    }
    options
        .iter()
        .position(|o| o == current)
        .and_then(|i| options.get(i + 1))
        .cloned()
        .unwrap_or_default()
}

/// Set of result ids picked for batch operations.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: HashSet<String>,
}

impl Selection {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &HashSet<String> {
        &self.ids
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_owned());
        }
    }

    /// Empties the selection when it already covers as many ids as the
    /// filtered view; otherwise selects exactly the filtered ids.
    pub fn toggle_all<'a>(&mut self, filtered: impl IntoIterator<Item = &'a ConformanceResult>) {
        let visible: HashSet<String> = filtered.into_iter().map(|r| r.id.clone()).collect();
        if self.ids.len() == visible.len() {
            self.ids.clear();
        } else {
            self.ids = visible;
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn ids(results: &[&ConformanceResult]) -> Vec<String> {
        results.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn empty_filters_return_everything() {
        let results = seed::demo_results();
        let filters = ConformanceFilters::default();
        assert_eq!(filters.apply(&results).len(), results.len());
        assert!(!filters.has_active_filters());
    }

    #[test]
    fn status_filter_returns_only_members() {
        let results = seed::demo_results();
        let mut filters = ConformanceFilters::default();
        filters.toggle_status(OverallStatus::ReviewRequired);
        filters.toggle_status(OverallStatus::ActionMandatory);
        let shown = filters.apply(&results);
        assert_eq!(shown.len(), 4);
        assert!(shown.iter().all(|r| filters.status.contains(&r.overall_status)));

        filters.toggle_status(OverallStatus::ReviewRequired);
        assert_eq!(ids(&filters.apply(&results)), vec!["result-5"]);
    }

    #[test]
    fn search_composes_with_other_filters() {
        let results = seed::demo_results();
        let filters = ConformanceFilters {
            status: vec![OverallStatus::PreApproved],
            search_query: "PIPE".into(),
            ..Default::default()
        };
        // Copper pipe and refrigerant piping are Pre-Approved; the fire pump
        // does not mention pipe; nothing Review Required leaks through.
        assert_eq!(ids(&filters.apply(&results)), vec!["result-4", "result-10"]);
    }

    #[test]
    fn search_matches_spec_section() {
        let results = seed::demo_results();
        let filters = ConformanceFilters {
            search_query: "21 13 13".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filters.apply(&results)), vec!["result-3"]);
    }

    #[test]
    fn division_and_system_type_match_exactly() {
        let results = seed::demo_results();
        let mut filters = ConformanceFilters {
            division: "Division 21 - Fire Suppression".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filters.apply(&results)), vec!["result-3", "result-8"]);
        filters.system_type = "Fire Pump".into();
        assert_eq!(ids(&filters.apply(&results)), vec!["result-8"]);
        filters.division = ANY.into();
        assert_eq!(ids(&filters.apply(&results)), vec!["result-8"]);
    }

    #[test]
    fn select_all_then_deselect_one() {
        let results = seed::demo_results();
        let filters = ConformanceFilters {
            status: vec![OverallStatus::PreApproved],
            search_query: String::new(),
            division: "Division 23 - HVAC".into(),
            system_type: String::new(),
        };
        let shown = filters.apply(&results);
        assert_eq!(shown.len(), 5);

        let mut selection = Selection::default();
        selection.toggle_all(shown.iter().copied());
        assert_eq!(selection.len(), 5);
        selection.toggle(&shown[2].id);
        assert_eq!(selection.len(), 4);

        // Not full any more, so select-all selects the whole view again.
        selection.toggle_all(shown.iter().copied());
        assert_eq!(selection.len(), 5);
        selection.toggle_all(shown.iter().copied());
        assert!(selection.is_empty());
    }

    #[test]
    fn cycle_option_wraps_to_any() {
        let options = vec!["A".to_owned(), "B".to_owned()];
        assert_eq!(cycle_option("", &options), "A");
        assert_eq!(cycle_option("A", &options), "B");
        assert_eq!(cycle_option("B", &options), "");
        assert_eq!(cycle_option("missing", &options), "");
    }
}
