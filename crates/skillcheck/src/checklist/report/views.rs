use super::super::domain::{Level, LevelSelection, Sheet};
use super::super::scoring::Aggregation;
use serde::Serialize;

/// Numbers behind the progress donut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub achieved: usize,
    pub unachieved: usize,
    pub total: usize,
    pub progress_percent: u8,
    /// Sum over all levels for `ALL`, otherwise the selected level only.
    pub remaining_required: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarAxis {
    pub label: String,
    pub value: f64,
}

/// Polar chart with a fixed 0..=100 radial range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarView {
    pub title: String,
    pub axes: Vec<RadarAxis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTableRow {
    pub category: String,
    pub achieved: usize,
    pub total: usize,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelSummaryRow {
    pub level: Level,
    pub level_label: &'static str,
    pub achieved: usize,
    pub total: usize,
    pub required_achieved: usize,
    pub required_total: usize,
    pub score: usize,
    pub max_score: usize,
    pub achieved_display: String,
    pub required_display: String,
    pub score_display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelSummaryView {
    pub rows: Vec<LevelSummaryRow>,
    pub total_score: usize,
    pub total_max_score: usize,
    pub total_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualificationView {
    pub level: Level,
    pub level_label: &'static str,
    pub title: &'static str,
    pub threshold_percent: u8,
    pub progress_percent: u8,
    pub remaining_required: usize,
    pub qualified: bool,
    pub narrative: String,
}

/// Cross-sheet dashboard for one level selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewReport {
    pub selection: LevelSelection,
    pub progress: Aggregation<ProgressView>,
    pub sheet_radar: Aggregation<RadarView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification: Option<QualificationView>,
    pub level_summary: Aggregation<LevelSummaryView>,
}

/// Drill-down into one sheet by category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetReport {
    pub sheet: Sheet,
    pub sheet_label: &'static str,
    pub selection: LevelSelection,
    pub progress: Aggregation<ProgressView>,
    pub category_radar: Aggregation<RadarView>,
    pub category_table: Aggregation<Vec<CategoryTableRow>>,
}
