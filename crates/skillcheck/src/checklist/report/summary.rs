use super::super::answers::AnswerSheet;
use super::super::catalog::Catalog;
use super::super::domain::{ChecklistItem, LevelSelection, Sheet};
use super::super::filter::CatalogFilter;
use super::super::scoring::{self, Aggregation, LevelSummary, Tally};
use super::qualification;
use super::views::{
    CategoryTableRow, LevelSummaryRow, LevelSummaryView, OverviewReport, ProgressView, RadarAxis,
    RadarView, SheetReport,
};
use std::collections::BTreeMap;

/// Answers for every sheet of one user; missing sheets read as unanswered.
pub type SheetAnswers = BTreeMap<Sheet, AnswerSheet>;

pub fn overview(
    catalog: &Catalog,
    answers: &SheetAnswers,
    selection: LevelSelection,
) -> OverviewReport {
    let empty = AnswerSheet::default();
    let filter = CatalogFilter::for_selection(selection);
    let mut combined = Tally::default();
    let mut axes = Vec::new();

    for sheet in Sheet::ordered() {
        let sheet_answers = answers.get(&sheet).unwrap_or(&empty);
        let items = filter.apply(catalog.items(sheet));
        let tally = Tally::of(items.iter().copied(), sheet_answers);
        if let Some(rate) = tally.rate() {
            axes.push(RadarAxis {
                label: sheet.label().to_string(),
                value: rate,
            });
        }
        combined.merge(&tally);
    }

    let sheet_radar = if axes.is_empty() {
        Aggregation::no_data()
    } else {
        Aggregation::ready(RadarView {
            title: format!("Overall skill achievement ({})", selection.label()),
            axes,
        })
    };

    let qualification = match selection {
        LevelSelection::Only(level) => qualification::evaluate(level, &combined),
        LevelSelection::All => None,
    };

    OverviewReport {
        selection,
        progress: progress_view(&combined, selection),
        sheet_radar,
        qualification,
        level_summary: level_summary(catalog, answers),
    }
}

/// Level table over the whole catalog regardless of any level selection.
pub fn level_summary(catalog: &Catalog, answers: &SheetAnswers) -> Aggregation<LevelSummaryView> {
    let empty = AnswerSheet::default();
    let sheets = Sheet::ordered()
        .map(|sheet| (catalog.items(sheet), answers.get(&sheet).unwrap_or(&empty)));
    scoring::level_summary(sheets).map(level_summary_view)
}

pub fn sheet_report(
    catalog: &Catalog,
    sheet: Sheet,
    answers: &AnswerSheet,
    selection: LevelSelection,
) -> SheetReport {
    let items = CatalogFilter::for_selection(selection).apply(catalog.items(sheet));
    let tally = Tally::of(items.iter().copied(), answers);
    let rates = scoring::category_rates(&items, answers);

    let (category_radar, category_table) = if rates.is_empty() {
        (Aggregation::no_data(), Aggregation::no_data())
    } else {
        let axes = rates
            .iter()
            .map(|rate| RadarAxis {
                label: rate.category.clone(),
                value: rate.rate,
            })
            .collect();
        let rows = rates
            .into_iter()
            .map(|rate| CategoryTableRow {
                display: format!("{}/{}", rate.achieved, rate.total),
                category: rate.category,
                achieved: rate.achieved,
                total: rate.total,
            })
            .collect();
        (
            Aggregation::ready(RadarView {
                title: format!(
                    "{} - {} category achievement",
                    sheet.label(),
                    selection.label()
                ),
                axes,
            }),
            Aggregation::ready(rows),
        )
    };

    SheetReport {
        sheet,
        sheet_label: sheet.label(),
        selection,
        progress: progress_view(&tally, selection),
        category_radar,
        category_table,
    }
}

/// Items of a sheet joined with the user's answers, in catalog order.
pub fn checklist_entries<'a>(
    items: &[&'a ChecklistItem],
    answers: &AnswerSheet,
) -> Vec<(&'a ChecklistItem, bool)> {
    items
        .iter()
        .map(|item| (*item, answers.achieved(item.id)))
        .collect()
}

fn progress_view(tally: &Tally, selection: LevelSelection) -> Aggregation<ProgressView> {
    let Some(progress_percent) = tally.progress_percent() else {
        return Aggregation::no_data();
    };

    let remaining_required = match selection {
        LevelSelection::All => tally.remaining_required_total(),
        LevelSelection::Only(level) => tally
            .remaining_required
            .get(&level)
            .copied()
            .unwrap_or_default(),
    };

    Aggregation::ready(ProgressView {
        achieved: tally.achieved,
        unachieved: tally.unachieved(),
        total: tally.total,
        progress_percent,
        remaining_required,
    })
}

fn level_summary_view(summary: LevelSummary) -> LevelSummaryView {
    let rows = summary
        .levels
        .into_iter()
        .map(|row| LevelSummaryRow {
            level: row.level,
            level_label: row.level.stars(),
            achieved: row.achieved,
            total: row.total,
            required_achieved: row.required_achieved,
            required_total: row.required_total,
            score: row.score,
            max_score: row.max_score,
            achieved_display: format!("{} / {}", row.achieved, row.total),
            required_display: format!("{} / {}", row.required_achieved, row.required_total),
            score_display: format!("{} / {}", row.score, row.max_score),
        })
        .collect();

    LevelSummaryView {
        rows,
        total_score: summary.total_score,
        total_max_score: summary.total_max_score,
        total_display: format!("{} / {}", summary.total_score, summary.total_max_score),
    }
}
