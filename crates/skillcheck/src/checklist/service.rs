use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::info;

use super::answers::{AnswerCache, AnswerRecord, AnswerSheet, AnswerStore};
use super::catalog::Catalog;
use super::domain::{ChecklistItem, ItemId, LevelSelection, Sheet, UserId};
use super::filter::CatalogFilter;
use super::report::views::{LevelSummaryView, OverviewReport, SheetReport};
use super::report::{self, SheetAnswers};
use super::scoring::Aggregation;
use crate::store::StoreError;

/// One checklist row as presented to the user, with their current answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistEntry {
    #[serde(flatten)]
    pub item: ChecklistItem,
    pub achieved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetOverview {
    pub sheet: Sheet,
    pub label: &'static str,
    pub workbook_name: &'static str,
    pub categories: Vec<String>,
    pub item_count: usize,
}

/// Service composing the catalog, the answer store and the per-process answer cache.
pub struct SkillCheckService<S> {
    catalog: Arc<Catalog>,
    store: Arc<S>,
    cache: Mutex<AnswerCache>,
}

impl<S> SkillCheckService<S>
where
    S: AnswerStore + 'static,
{
    pub fn new(catalog: Arc<Catalog>, store: Arc<S>) -> Self {
        Self {
            catalog,
            store,
            cache: Mutex::new(AnswerCache::new()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sheets(&self) -> Vec<SheetOverview> {
        Sheet::ordered()
            .into_iter()
            .map(|sheet| SheetOverview {
                sheet,
                label: sheet.label(),
                workbook_name: sheet.workbook_name(),
                categories: self
                    .catalog
                    .categories(sheet)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                item_count: self.catalog.items(sheet).len(),
            })
            .collect()
    }

    pub fn answers(&self, user_id: &UserId, sheet: Sheet) -> Result<AnswerSheet, ServiceError> {
        let mut cache = self.cache()?;
        Ok(cache.load(self.store.as_ref(), user_id, sheet)?.clone())
    }

    fn answers_by_sheet(&self, user_id: &UserId) -> Result<SheetAnswers, ServiceError> {
        let mut cache = self.cache()?;
        let mut answers = SheetAnswers::new();
        for sheet in Sheet::ordered() {
            let sheet_answers = cache.load(self.store.as_ref(), user_id, sheet)?.clone();
            answers.insert(sheet, sheet_answers);
        }
        Ok(answers)
    }

    /// Filtered items of a sheet with the user's stored answers merged in.
    pub fn checklist(
        &self,
        user_id: &UserId,
        sheet: Sheet,
        filter: &CatalogFilter,
    ) -> Result<Vec<ChecklistEntry>, ServiceError> {
        let answers = self.answers(user_id, sheet)?;
        let items = filter.apply(self.catalog.items(sheet));
        Ok(report::checklist_entries(&items, &answers)
            .into_iter()
            .map(|(item, achieved)| ChecklistEntry {
                item: item.clone(),
                achieved,
            })
            .collect())
    }

    /// Replaces the stored answers for the sheet. Items missing from `answers`
    /// read as not achieved afterwards.
    pub fn save(
        &self,
        user_id: &UserId,
        sheet: Sheet,
        answers: AnswerSheet,
    ) -> Result<AnswerRecord, ServiceError> {
        let unknown: Vec<ItemId> = answers
            .iter()
            .map(|(id, _)| id)
            .filter(|id| !self.catalog.contains(sheet, *id))
            .collect();
        if !unknown.is_empty() {
            return Err(ServiceError::UnknownItems { sheet, ids: unknown });
        }

        let record = self.store.put(user_id, sheet, &answers)?;
        self.cache()?.invalidate(user_id, sheet);

        info!(
            user = %user_id,
            %sheet,
            answers = answers.len(),
            "answers saved"
        );
        Ok(record)
    }

    pub fn overview(
        &self,
        user_id: &UserId,
        selection: LevelSelection,
    ) -> Result<OverviewReport, ServiceError> {
        let answers = self.answers_by_sheet(user_id)?;
        Ok(report::overview(&self.catalog, &answers, selection))
    }

    pub fn level_summary(
        &self,
        user_id: &UserId,
    ) -> Result<Aggregation<LevelSummaryView>, ServiceError> {
        let answers = self.answers_by_sheet(user_id)?;
        Ok(report::level_summary(&self.catalog, &answers))
    }

    pub fn sheet_report(
        &self,
        user_id: &UserId,
        sheet: Sheet,
        selection: LevelSelection,
    ) -> Result<SheetReport, ServiceError> {
        let answers = self.answers(user_id, sheet)?;
        Ok(report::sheet_report(&self.catalog, sheet, &answers, selection))
    }

    fn cache(&self) -> Result<MutexGuard<'_, AnswerCache>, ServiceError> {
        self.cache
            .lock()
            .map_err(|_| StoreError::Unavailable("answer cache lock poisoned".to_string()).into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("sheet {sheet} has no items numbered {}", join_ids(.ids))]
    UnknownItems { sheet: Sheet, ids: Vec<ItemId> },
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn join_ids(ids: &[ItemId]) -> String {
    ids.iter()
        .map(ItemId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
