use crate::infra::Backend;
use clap::Args;
use skillcheck::checklist::report::views::{
    OverviewReport, ProgressView, RadarView, SheetReport,
};
use skillcheck::checklist::{Aggregation, LevelSelection, Sheet, UserId};
use skillcheck::config::AppConfig;
use skillcheck::error::AppError;
use skillcheck::telemetry::{self, LogSink};
use std::io::{self, Write};

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// User whose stored answers are reported
    #[arg(long)]
    pub(crate) user: String,
    /// Level filter: ALL, 1-3 or ★ glyphs
    #[arg(long, default_value = "ALL")]
    pub(crate) level: String,
    /// Add a category drill-down for one sheet (file stem, label or workbook name)
    #[arg(long)]
    pub(crate) sheet: Option<String>,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::Stderr)?;

    let user = UserId::new(args.user)?;
    let selection: LevelSelection = args.level.parse()?;
    let sheet = args.sheet.as_deref().map(str::parse::<Sheet>).transpose()?;

    let backend = Backend::open(&config)?;
    let overview = backend.service.overview(&user, selection)?;
    let mut out = io::stdout().lock();
    write_overview(&mut out, &user, &overview)?;

    if let Some(sheet) = sheet {
        let report = backend.service.sheet_report(&user, sheet, selection)?;
        writeln!(out)?;
        write_sheet_report(&mut out, &report)?;
    }

    out.flush()?;
    Ok(())
}

pub(crate) fn write_overview(
    out: &mut impl Write,
    user: &UserId,
    report: &OverviewReport,
) -> io::Result<()> {
    writeln!(out, "Skill check for {} (level {})", user, report.selection)?;

    writeln!(out, "\nProgress")?;
    write_progress(out, &report.progress)?;

    writeln!(out, "\nAchievement by sheet")?;
    write_radar(out, &report.sheet_radar)?;

    if let Some(qualification) = &report.qualification {
        let verdict = if qualification.qualified {
            "reached"
        } else {
            "not yet reached"
        };
        writeln!(
            out,
            "\nQualification {}: {} ({}% of {}% needed, {} required remaining)",
            qualification.level_label,
            verdict,
            qualification.progress_percent,
            qualification.threshold_percent,
            qualification.remaining_required
        )?;
        writeln!(out, "  {}", qualification.narrative)?;
    }

    writeln!(out, "\nLevel summary")?;
    match &report.level_summary {
        Aggregation::Ready { data } => {
            writeln!(
                out,
                "  {:<6} {:>10} {:>10} {:>10}",
                "Level", "Achieved", "Required", "Score"
            )?;
            for row in &data.rows {
                writeln!(
                    out,
                    "  {:<6} {:>10} {:>10} {:>10}",
                    row.level_label, row.achieved_display, row.required_display, row.score_display
                )?;
            }
            writeln!(out, "  Total score {}", data.total_display)?;
        }
        Aggregation::NoData { message } => {
            writeln!(out, "  {message}")?;
        }
    }

    Ok(())
}

pub(crate) fn write_sheet_report(out: &mut impl Write, report: &SheetReport) -> io::Result<()> {
    writeln!(
        out,
        "{} ({}) level {}",
        report.sheet_label,
        report.sheet.workbook_name(),
        report.selection
    )?;
    write_progress(out, &report.progress)?;

    writeln!(out, "\nCategories")?;
    match &report.category_table {
        Aggregation::Ready { data } => {
            for row in data {
                writeln!(out, "- {}: {}", row.category, row.display)?;
            }
        }
        Aggregation::NoData { message } => {
            writeln!(out, "  {message}")?;
        }
    }

    Ok(())
}

fn write_progress(out: &mut impl Write, progress: &Aggregation<ProgressView>) -> io::Result<()> {
    match progress {
        Aggregation::Ready { data } => {
            writeln!(
                out,
                "  {} / {} achieved ({}%), {} open",
                data.achieved, data.total, data.progress_percent, data.unachieved
            )?;
            writeln!(out, "  Required items remaining: {}", data.remaining_required)?;
        }
        Aggregation::NoData { message } => {
            writeln!(out, "  {message}")?;
        }
    }
    Ok(())
}

fn write_radar(out: &mut impl Write, radar: &Aggregation<RadarView>) -> io::Result<()> {
    match radar {
        Aggregation::Ready { data } => {
            for axis in &data.axes {
                writeln!(out, "- {}: {:.1}%", axis.label, axis.value)?;
            }
        }
        Aggregation::NoData { message } => {
            writeln!(out, "  {message}")?;
        }
    }
    Ok(())
}
