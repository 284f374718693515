//! Achievement ratios and weighted scores over checklist items.
//!
//! Required items are weighted twice: once as an ordinary item and once as a
//! bonus, so a level's maximum score is `items + required items`.

use super::answers::AnswerSheet;
use super::domain::{ChecklistItem, Level};
use serde::Serialize;
use std::collections::BTreeMap;

pub const NO_DATA_MESSAGE: &str = "no data to display";

/// Outcome of every aggregation entry point. An empty item slice is not an
/// error; callers render a placeholder instead of a ratio.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Aggregation<T> {
    NoData { message: &'static str },
    Ready { data: T },
}

impl<T> Aggregation<T> {
    pub fn no_data() -> Self {
        Self::NoData {
            message: NO_DATA_MESSAGE,
        }
    }

    pub fn ready(data: T) -> Self {
        Self::Ready { data }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready { data } => Some(data),
            Self::NoData { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Ready { data } => Some(data),
            Self::NoData { .. } => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Aggregation<U> {
        match self {
            Self::Ready { data } => Aggregation::ready(f(data)),
            Self::NoData { message } => Aggregation::NoData { message },
        }
    }
}

/// Raw counts over a slice of items, mergeable across sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub achieved: usize,
    pub total: usize,
    pub required_achieved: usize,
    pub required_total: usize,
    /// Unachieved required items per level; every level is always present.
    pub remaining_required: BTreeMap<Level, usize>,
}

impl Default for Tally {
    fn default() -> Self {
        Self {
            achieved: 0,
            total: 0,
            required_achieved: 0,
            required_total: 0,
            remaining_required: Level::ordered().into_iter().map(|level| (level, 0)).collect(),
        }
    }
}

impl Tally {
    pub fn of<'a, I>(items: I, answers: &AnswerSheet) -> Self
    where
        I: IntoIterator<Item = &'a ChecklistItem>,
    {
        let mut tally = Tally::default();
        for item in items {
            tally.record(item, answers.achieved(item.id));
        }
        tally
    }

    fn record(&mut self, item: &ChecklistItem, achieved: bool) {
        self.total += 1;
        if achieved {
            self.achieved += 1;
        }
        if item.required {
            self.required_total += 1;
            if achieved {
                self.required_achieved += 1;
            } else {
                *self.remaining_required.entry(item.level).or_insert(0) += 1;
            }
        }
    }

    pub fn merge(&mut self, other: &Tally) {
        self.achieved += other.achieved;
        self.total += other.total;
        self.required_achieved += other.required_achieved;
        self.required_total += other.required_total;
        for (level, remaining) in &other.remaining_required {
            *self.remaining_required.entry(*level).or_insert(0) += remaining;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn unachieved(&self) -> usize {
        self.total - self.achieved
    }

    pub fn score(&self) -> usize {
        self.achieved + self.required_achieved
    }

    pub fn max_score(&self) -> usize {
        self.total + self.required_total
    }

    pub fn remaining_required_total(&self) -> usize {
        self.remaining_required.values().sum()
    }

    /// Unrounded achievement rate in percent; `None` for an empty tally.
    pub fn rate(&self) -> Option<f64> {
        ratio(self.achieved, self.total)
    }

    pub fn progress_percent(&self) -> Option<u8> {
        self.rate().map(round_percent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRate {
    pub category: String,
    pub achieved: usize,
    pub total: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub achieved_count: usize,
    pub total_count: usize,
    pub remaining_required: BTreeMap<Level, usize>,
    pub category_rates: Vec<CategoryRate>,
    pub score: usize,
    pub max_score: usize,
}

impl AggregateResult {
    pub fn progress_percent(&self) -> u8 {
        ratio(self.achieved_count, self.total_count)
            .map(round_percent)
            .unwrap_or(0)
    }
}

/// Aggregates one sheet's (already filtered) items against the user's answers.
pub fn score(items: &[&ChecklistItem], answers: &AnswerSheet) -> Aggregation<AggregateResult> {
    let tally = Tally::of(items.iter().copied(), answers);
    if tally.is_empty() {
        return Aggregation::no_data();
    }

    Aggregation::ready(AggregateResult {
        achieved_count: tally.achieved,
        total_count: tally.total,
        score: tally.score(),
        max_score: tally.max_score(),
        category_rates: category_rates(items, answers),
        remaining_required: tally.remaining_required,
    })
}

/// Achievement rate per category, sorted by category name. Categories only
/// appear when they have at least one item.
pub fn category_rates(items: &[&ChecklistItem], answers: &AnswerSheet) -> Vec<CategoryRate> {
    let mut grouped: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for item in items {
        let entry = grouped.entry(item.category.as_str()).or_insert((0, 0));
        entry.1 += 1;
        if answers.achieved(item.id) {
            entry.0 += 1;
        }
    }

    grouped
        .into_iter()
        .filter_map(|(category, (achieved, total))| {
            ratio(achieved, total).map(|rate| CategoryRate {
                category: category.to_string(),
                achieved,
                total,
                rate,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelScore {
    pub level: Level,
    pub achieved: usize,
    pub total: usize,
    pub required_achieved: usize,
    pub required_total: usize,
    pub score: usize,
    pub max_score: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelSummary {
    pub levels: Vec<LevelScore>,
    pub total_score: usize,
    pub total_max_score: usize,
}

/// Per-level scores over the full catalog of every sheet passed in, ignoring
/// any display filter. Levels without items are left out of the table.
pub fn level_summary<'a, I>(sheets: I) -> Aggregation<LevelSummary>
where
    I: IntoIterator<Item = (&'a [ChecklistItem], &'a AnswerSheet)>,
{
    let mut per_level: BTreeMap<Level, Tally> = BTreeMap::new();
    for (items, answers) in sheets {
        for level in Level::ordered() {
            let tally = Tally::of(items.iter().filter(|item| item.level == level), answers);
            per_level.entry(level).or_default().merge(&tally);
        }
    }

    let levels: Vec<LevelScore> = per_level
        .into_iter()
        .filter(|(_, tally)| !tally.is_empty())
        .map(|(level, tally)| LevelScore {
            level,
            achieved: tally.achieved,
            total: tally.total,
            required_achieved: tally.required_achieved,
            required_total: tally.required_total,
            score: tally.score(),
            max_score: tally.max_score(),
        })
        .collect();

    if levels.is_empty() {
        return Aggregation::no_data();
    }

    let total_score = levels.iter().map(|row| row.score).sum();
    let total_max_score = levels.iter().map(|row| row.max_score).sum();
    Aggregation::ready(LevelSummary {
        levels,
        total_score,
        total_max_score,
    })
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64 * 100.0)
    }
}

/// Halves round to even, so 12.5% displays as 12 and 37.5% as 38.
fn round_percent(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 100.0) as u8
}
