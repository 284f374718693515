use super::super::domain::Level;
use super::super::scoring::Tally;
use super::views::QualificationView;

struct QualificationRule {
    title: &'static str,
    tier: &'static str,
    threshold_percent: u8,
}

const fn rule(level: Level) -> QualificationRule {
    match level {
        Level::One => QualificationRule {
            title: "Assistant Data Scientist",
            tier: "apprentice",
            threshold_percent: 70,
        },
        Level::Two => QualificationRule {
            title: "Associate Data Scientist",
            tier: "independent",
            threshold_percent: 60,
        },
        Level::Three => QualificationRule {
            title: "Full Data Scientist",
            tier: "master",
            threshold_percent: 50,
        },
    }
}

/// A level is met once its unrounded progress reaches the threshold and every
/// required item at that level is achieved. `None` when the level has no items.
pub(crate) fn evaluate(level: Level, tally: &Tally) -> Option<QualificationView> {
    let rate = tally.rate()?;
    let progress_percent = tally.progress_percent()?;
    let rule = rule(level);
    let remaining_required = tally
        .remaining_required
        .get(&level)
        .copied()
        .unwrap_or_default();
    let qualified = rate >= f64::from(rule.threshold_percent) && remaining_required == 0;

    Some(QualificationView {
        level,
        level_label: level.stars(),
        title: rule.title,
        threshold_percent: rule.threshold_percent,
        progress_percent,
        remaining_required,
        qualified,
        narrative: format!(
            "{} ({} tier): {} progress of {}% or more with every {} required item achieved",
            rule.title,
            rule.tier,
            level.stars(),
            rule.threshold_percent,
            level.stars()
        ),
    })
}
