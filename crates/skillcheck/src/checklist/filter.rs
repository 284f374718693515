use super::domain::{ChecklistItem, Level, LevelSelection};
use std::collections::BTreeSet;

/// Narrows a sheet's items for display. Empty level or category sets mean
/// "everything", never "nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub levels: BTreeSet<Level>,
    pub categories: Vec<String>,
    pub required_only: bool,
}

impl CatalogFilter {
    pub fn for_selection(selection: LevelSelection) -> Self {
        let levels = match selection {
            LevelSelection::Only(level) => BTreeSet::from([level]),
            LevelSelection::All => BTreeSet::new(),
        };
        Self {
            levels,
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &ChecklistItem) -> bool {
        let level_ok = self.levels.is_empty() || self.levels.contains(&item.level);
        let category_ok =
            self.categories.is_empty() || self.categories.iter().any(|c| *c == item.category);
        let required_ok = !self.required_only || item.required;
        level_ok && category_ok && required_ok
    }

    pub fn apply<'a>(&self, items: &'a [ChecklistItem]) -> Vec<&'a ChecklistItem> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::domain::{ItemId, Sheet};

    fn item(id: u32, category: &str, level: Level, required: bool) -> ChecklistItem {
        ChecklistItem {
            id: ItemId(id),
            sheet: Sheet::DataScience,
            category: category.to_string(),
            subcategory: String::new(),
            level,
            description: format!("item {id}"),
            required,
        }
    }

    fn sample() -> Vec<ChecklistItem> {
        vec![
            item(1, "統計数理", Level::One, true),
            item(2, "統計数理", Level::Two, false),
            item(3, "機械学習", Level::One, false),
            item(4, "機械学習", Level::Three, true),
        ]
    }

    fn ids(items: &[&ChecklistItem]) -> Vec<u32> {
        items.iter().map(|item| item.id.0).collect()
    }

    #[test]
    fn empty_filter_keeps_every_item() {
        let items = sample();
        assert_eq!(ids(&CatalogFilter::default().apply(&items)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_categories_match_explicit_full_category_list() {
        let items = sample();
        let implicit = CatalogFilter {
            levels: BTreeSet::from([Level::One]),
            ..CatalogFilter::default()
        };
        let explicit = CatalogFilter {
            categories: vec!["統計数理".to_string(), "機械学習".to_string()],
            ..implicit.clone()
        };
        assert_eq!(implicit.apply(&items), explicit.apply(&items));
        assert_eq!(ids(&implicit.apply(&items)), vec![1, 3]);
    }

    #[test]
    fn predicates_combine_as_conjunction() {
        let items = sample();
        let filter = CatalogFilter {
            levels: BTreeSet::from([Level::One, Level::Three]),
            categories: vec!["機械学習".to_string()],
            required_only: true,
        };
        assert_eq!(ids(&filter.apply(&items)), vec![4]);
    }

    #[test]
    fn filtering_to_nothing_is_not_an_error() {
        let items = sample();
        let filter = CatalogFilter {
            levels: BTreeSet::from([Level::Two]),
            required_only: true,
            ..CatalogFilter::default()
        };
        assert!(filter.apply(&items).is_empty());
    }

    #[test]
    fn selection_all_leaves_levels_unrestricted() {
        assert!(CatalogFilter::for_selection(LevelSelection::All)
            .levels
            .is_empty());
        assert_eq!(
            CatalogFilter::for_selection(LevelSelection::Only(Level::Two)).levels,
            BTreeSet::from([Level::Two])
        );
    }
}
