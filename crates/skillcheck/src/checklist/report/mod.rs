mod qualification;
mod summary;
pub mod views;

pub use summary::{checklist_entries, level_summary, overview, sheet_report, SheetAnswers};
