//! Deal auto-selection
//!
//! Pre-populates a user's choice of one brand/store option per requested
//! item before manual review. Selection is deterministic: options are
//! scanned in their original order and the first one wins on an exact tie.

use cartpath_client::{BrandGroup, BrandItem};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// How to pick an option within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionStrategy {
    /// Lowest price. A missing price counts as 0.
    Cheapest,
    /// Highest savings. Missing savings count as 0.
    MaxSavings,
    /// Shortest distance among options that report one, else the first option
    Closest,
}

impl SelectionStrategy {
    /// Parse from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cheapest" => Some(Self::Cheapest),
            "maxsavings" | "max-savings" | "max_savings" => Some(Self::MaxSavings),
            "closest" => Some(Self::Closest),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cheapest => "cheapest",
            Self::MaxSavings => "maxSavings",
            Self::Closest => "closest",
        }
    }
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pick one option from a group, or `None` for an empty group
pub fn select_for_group(group: &BrandGroup, strategy: SelectionStrategy) -> Option<&BrandItem> {
    let options = &group.options;
    match strategy {
        SelectionStrategy::Cheapest => {
            first_best_by(options, |option| option.price.unwrap_or(0.0), |a, b| a < b)
        }
        SelectionStrategy::MaxSavings => {
            first_best_by(options, |option| option.savings.unwrap_or(0.0), |a, b| a > b)
        }
        SelectionStrategy::Closest => {
            let with_distance: Vec<&BrandItem> =
                options.iter().filter(|option| option.distance.is_some()).collect();
            if with_distance.is_empty() {
                return options.first();
            }
            with_distance.into_iter().fold(None, |best: Option<&BrandItem>, option| match best {
                Some(current) if current.distance <= option.distance => Some(current),
                _ => Some(option),
            })
        }
    }
}

/// Scan in order, replacing the current pick only when `better` holds
/// strictly, so earlier options win ties.
fn first_best_by<'a>(
    options: &'a [BrandItem],
    key: impl Fn(&BrandItem) -> f64,
    better: impl Fn(f64, f64) -> bool,
) -> Option<&'a BrandItem> {
    let mut iter = options.iter();
    let mut best = iter.next()?;
    let mut best_key = key(best);
    for option in iter {
        let k = key(option);
        if better(k, best_key) {
            best = option;
            best_key = k;
        }
    }
    Some(best)
}

/// Ids of the option picked for every non-empty group
pub fn auto_select(groups: &[BrandGroup], strategy: SelectionStrategy) -> HashSet<String> {
    groups
        .iter()
        .filter_map(|group| select_for_group(group, strategy))
        .map(|option| option.id.clone())
        .collect()
}

/// The user's current choice of option per requested item
///
/// Choices are addressed by group position, so two groups that carry the
/// same item name each keep their own pick. Applying a strategy is
/// destructive: it discards every earlier choice, manual overrides included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealSelection {
    /// group index -> chosen option id
    choices: BTreeMap<usize, String>,
    /// Strategy that produced the current choices, if any
    strategy: Option<SelectionStrategy>,
}

impl DealSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all choices with the strategy's picks
    pub fn apply_strategy(&mut self, groups: &[BrandGroup], strategy: SelectionStrategy) {
        self.choices = groups
            .iter()
            .enumerate()
            .filter_map(|(index, group)| {
                select_for_group(group, strategy).map(|option| (index, option.id.clone()))
            })
            .collect();
        self.strategy = Some(strategy);
    }

    /// Manually pick an option for the group at `group_index`
    pub fn choose(&mut self, group_index: usize, option_id: impl Into<String>) {
        self.choices.insert(group_index, option_id.into());
    }

    /// Drop the choice for one group
    pub fn clear(&mut self, group_index: usize) -> bool {
        self.choices.remove(&group_index).is_some()
    }

    pub fn choice(&self, group_index: usize) -> Option<&str> {
        self.choices.get(&group_index).map(String::as_str)
    }

    pub fn strategy(&self) -> Option<SelectionStrategy> {
        self.strategy
    }

    pub fn selected_ids(&self) -> HashSet<String> {
        self.choices.values().cloned().collect()
    }

    /// Chosen options, in group order
    pub fn selected_options<'a>(&self, groups: &'a [BrandGroup]) -> Vec<&'a BrandItem> {
        groups
            .iter()
            .enumerate()
            .filter_map(|(index, group)| {
                let chosen = self.choices.get(&index)?;
                group.options.iter().find(|option| &option.id == chosen)
            })
            .collect()
    }

    /// Sum of savings over the chosen options
    pub fn estimated_savings(&self, groups: &[BrandGroup]) -> f64 {
        self.selected_options(groups)
            .iter()
            .map(|option| option.savings.unwrap_or(0.0))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: &str) -> BrandItem {
        BrandItem {
            id: id.to_string(),
            brand_name: id.to_uppercase(),
            price: None,
            original_price: None,
            savings: None,
            distance: None,
            est_time: None,
            badge: None,
        }
    }

    fn priced(id: &str, price: f64, savings: f64) -> BrandItem {
        BrandItem {
            price: Some(price),
            savings: Some(savings),
            ..option(id)
        }
    }

    fn located(id: &str, distance: Option<f64>) -> BrandItem {
        BrandItem { distance, ..option(id) }
    }

    fn group(name: &str, options: Vec<BrandItem>) -> BrandGroup {
        BrandGroup {
            item_name: name.to_string(),
            item_details: String::new(),
            status: "DEAL_FOUND".to_string(),
            options,
        }
    }

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_cheapest_and_max_savings() {
        let groups = vec![group("milk", vec![priced("a", 5.0, 0.0), priced("b", 3.0, 2.0)])];

        assert_eq!(auto_select(&groups, SelectionStrategy::Cheapest), ids(&["b"]));
        assert_eq!(auto_select(&groups, SelectionStrategy::MaxSavings), ids(&["b"]));
    }

    #[test]
    fn test_closest_ignores_missing_distance() {
        let groups = vec![group(
            "eggs",
            vec![located("a", None), located("b", Some(2.0)), located("c", Some(1.0))],
        )];

        assert_eq!(auto_select(&groups, SelectionStrategy::Closest), ids(&["c"]));
    }

    #[test]
    fn test_closest_without_distances_takes_first() {
        let groups = vec![group("bread", vec![located("x", None), located("y", None)])];
        assert_eq!(auto_select(&groups, SelectionStrategy::Closest), ids(&["x"]));
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let groups = vec![group(
            "rice",
            vec![priced("first", 2.0, 1.0), priced("second", 2.0, 1.0)],
        )];
        assert_eq!(auto_select(&groups, SelectionStrategy::Cheapest), ids(&["first"]));
        assert_eq!(auto_select(&groups, SelectionStrategy::MaxSavings), ids(&["first"]));

        let near = vec![group("rice", vec![located("p", Some(1.0)), located("q", Some(1.0))])];
        assert_eq!(auto_select(&near, SelectionStrategy::Closest), ids(&["p"]));
    }

    #[test]
    fn test_missing_price_counts_as_free() {
        let groups = vec![group("tea", vec![priced("paid", 1.0, 0.5), option("unpriced")])];
        assert_eq!(auto_select(&groups, SelectionStrategy::Cheapest), ids(&["unpriced"]));
    }

    #[test]
    fn test_empty_groups_are_skipped() {
        let groups = vec![
            group("empty", Vec::new()),
            group("jam", vec![priced("j", 3.0, 0.0)]),
        ];
        assert_eq!(auto_select(&groups, SelectionStrategy::Cheapest), ids(&["j"]));
        assert!(auto_select(&[], SelectionStrategy::Closest).is_empty());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(SelectionStrategy::from_str("maxSavings"), Some(SelectionStrategy::MaxSavings));
        assert_eq!(SelectionStrategy::from_str("max-savings"), Some(SelectionStrategy::MaxSavings));
        assert_eq!(SelectionStrategy::from_str("CLOSEST"), Some(SelectionStrategy::Closest));
        assert_eq!(SelectionStrategy::from_str("fastest"), None);
    }

    #[test]
    fn test_strategy_replaces_manual_choices() {
        let groups = vec![
            group("milk", vec![priced("m1", 4.0, 0.5), priced("m2", 3.0, 1.0)]),
            group("eggs", vec![priced("e1", 2.0, 0.0)]),
        ];

        let mut selection = DealSelection::new();
        selection.choose(0, "m1");
        selection.choose(7, "f9");

        selection.apply_strategy(&groups, SelectionStrategy::Cheapest);

        assert_eq!(selection.choice(0), Some("m2"));
        assert_eq!(selection.choice(7), None);
        assert_eq!(selection.selected_ids(), ids(&["m2", "e1"]));
        assert_eq!(selection.strategy(), Some(SelectionStrategy::Cheapest));
    }

    #[test]
    fn test_selected_options_and_savings() {
        let groups = vec![
            group("milk", vec![priced("m1", 4.0, 0.5), priced("m2", 3.0, 1.25)]),
            group("eggs", vec![priced("e1", 2.0, 0.25)]),
        ];

        let mut selection = DealSelection::new();
        selection.apply_strategy(&groups, SelectionStrategy::MaxSavings);
        selection.choose(0, "m1");

        let chosen: Vec<&str> = selection
            .selected_options(&groups)
            .iter()
            .map(|option| option.id.as_str())
            .collect();
        assert_eq!(chosen, vec!["m1", "e1"]);
        assert_eq!(selection.estimated_savings(&groups), 0.75);

        assert!(selection.clear(1));
        assert!(!selection.clear(1));
    }

    #[test]
    fn test_groups_sharing_a_name_keep_separate_choices() {
        let groups = vec![
            group("milk", vec![priced("a", 1.0, 0.5)]),
            group("milk", vec![priced("b", 2.0, 0.25)]),
        ];

        let mut selection = DealSelection::new();
        selection.apply_strategy(&groups, SelectionStrategy::Cheapest);

        assert_eq!(selection.choice(0), Some("a"));
        assert_eq!(selection.choice(1), Some("b"));
        assert_eq!(selection.selected_ids(), auto_select(&groups, SelectionStrategy::Cheapest));
        assert_eq!(selection.estimated_savings(&groups), 0.75);
    }
}
