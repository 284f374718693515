mod parser;

use crate::checklist::domain::{ChecklistItem, ItemId, Sheet};
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub enum CatalogError {
    Io { path: PathBuf, source: std::io::Error },
    Csv(csv::Error),
    MissingHeader { sheet: Sheet },
    MalformedRow { sheet: Sheet, line: u64, reason: String },
    DuplicateItem { sheet: Sheet, id: ItemId, line: u64 },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io { path, source } => {
                write!(f, "failed to read catalog file {}: {}", path.display(), source)
            }
            CatalogError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogError::MissingHeader { sheet } => write!(
                f,
                "catalog sheet {} ends before its header row",
                sheet.workbook_name()
            ),
            CatalogError::MalformedRow {
                sheet,
                line,
                reason,
            } => write!(
                f,
                "catalog sheet {} line {}: {}",
                sheet.workbook_name(),
                line,
                reason
            ),
            CatalogError::DuplicateItem { sheet, id, line } => write!(
                f,
                "catalog sheet {} line {}: item number {} appears twice",
                sheet.workbook_name(),
                line,
                id
            ),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io { source, .. } => Some(source),
            CatalogError::Csv(err) => Some(err),
            CatalogError::MissingHeader { .. }
            | CatalogError::MalformedRow { .. }
            | CatalogError::DuplicateItem { .. } => None,
        }
    }
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Immutable item catalog for every sheet, shared by all users.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sheets: BTreeMap<Sheet, Vec<ChecklistItem>>,
}

impl Catalog {
    /// Loads `<stem>.csv` for each sheet from `dir`, e.g. `data_science.csv`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let mut catalog = Catalog::default();

        for sheet in Sheet::ordered() {
            let path = dir.join(format!("{}.csv", sheet.file_stem()));
            let file = std::fs::File::open(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            catalog.load_sheet(sheet, file)?;
        }

        info!(
            directory = %dir.display(),
            items = catalog.len(),
            "checklist catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_readers<R, I>(sources: I) -> Result<Self, CatalogError>
    where
        R: Read,
        I: IntoIterator<Item = (Sheet, R)>,
    {
        let mut catalog = Catalog::default();
        for (sheet, reader) in sources {
            catalog.load_sheet(sheet, reader)?;
        }
        Ok(catalog)
    }

    pub fn from_items(items: impl IntoIterator<Item = ChecklistItem>) -> Self {
        let mut sheets: BTreeMap<Sheet, Vec<ChecklistItem>> = BTreeMap::new();
        for item in items {
            sheets.entry(item.sheet).or_default().push(item);
        }
        Self { sheets }
    }

    fn load_sheet<R: Read>(&mut self, sheet: Sheet, reader: R) -> Result<(), CatalogError> {
        let items = parser::parse_items(sheet, reader)?;
        self.sheets.insert(sheet, items);
        Ok(())
    }

    /// Items of one sheet in workbook order; empty when the sheet was never loaded.
    pub fn items(&self, sheet: Sheet) -> &[ChecklistItem] {
        self.sheets.get(&sheet).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct categories of a sheet in order of first appearance.
    pub fn categories(&self, sheet: Sheet) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.items(sheet)
            .iter()
            .map(|item| item.category.as_str())
            .filter(|category| seen.insert(*category))
            .collect()
    }

    pub fn contains(&self, sheet: Sheet, id: ItemId) -> bool {
        self.items(sheet).iter().any(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.sheets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
