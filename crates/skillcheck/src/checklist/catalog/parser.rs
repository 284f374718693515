use super::CatalogError;
use crate::checklist::domain::{ChecklistItem, ItemId, Level, Sheet};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::io::Read;

/// Rows above the header in the published workbook (title and notes).
const LEADING_ROWS: usize = 2;

pub(crate) fn parse_items<R: Read>(
    sheet: Sheet,
    reader: R,
) -> Result<Vec<ChecklistItem>, CatalogError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = csv_reader.records();
    for _ in 0..LEADING_ROWS {
        if rows.next().transpose()?.is_none() {
            return Err(CatalogError::MissingHeader { sheet });
        }
    }
    let headers = rows
        .next()
        .transpose()?
        .ok_or(CatalogError::MissingHeader { sheet })?;

    let mut items = Vec::new();
    let mut seen = HashSet::new();

    for record in rows {
        let record = record?;
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or_default();
        let row: CatalogRow = record.deserialize(Some(&headers))?;

        let Some(description) = row.check_item else {
            continue;
        };

        let malformed = |reason: String| CatalogError::MalformedRow {
            sheet,
            line,
            reason,
        };

        let id = row
            .no
            .as_deref()
            .ok_or_else(|| malformed("missing item number".to_string()))?
            .parse::<ItemId>()
            .map_err(|err| malformed(err.to_string()))?;
        let category = row
            .category
            .ok_or_else(|| malformed("missing skill category".to_string()))?;
        let level = row
            .level
            .as_deref()
            .ok_or_else(|| malformed("missing skill level".to_string()))?
            .parse::<Level>()
            .map_err(|err| malformed(err.to_string()))?;
        let required = parse_required_flag(row.required.as_deref()).ok_or_else(|| {
            malformed(format!(
                "invalid required flag '{}'",
                row.required.unwrap_or_default()
            ))
        })?;

        if !seen.insert(id) {
            return Err(CatalogError::DuplicateItem { sheet, id, line });
        }

        items.push(ChecklistItem {
            id,
            sheet,
            category,
            subcategory: row.subcategory.unwrap_or_default(),
            level,
            description,
            required,
        });
    }

    Ok(items)
}

fn parse_required_flag(value: Option<&str>) -> Option<bool> {
    let Some(raw) = value else {
        return Some(false);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "○" | "◯" | "●" | "必須" => Some(true),
        "false" | "0" | "no" | "n" | "×" | "-" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "NO", alias = "no", default, deserialize_with = "empty_string_as_none")]
    no: Option<String>,
    #[serde(
        rename = "スキルカテゴリ",
        alias = "category",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    category: Option<String>,
    #[serde(
        rename = "サブカテゴリ",
        alias = "subcategory",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    subcategory: Option<String>,
    #[serde(
        rename = "スキルレベル",
        alias = "level",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    level: Option<String>,
    #[serde(
        rename = "チェック項目",
        alias = "check_item",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    check_item: Option<String>,
    #[serde(
        rename = "必須",
        alias = "required",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    required: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
