//! Skill checklist: catalog, answers, scoring and the HTTP surface over them.

pub mod answers;
pub mod catalog;
pub mod domain;
pub mod filter;
pub mod report;
pub mod router;
pub mod scoring;
pub mod service;

pub use answers::{AnswerCache, AnswerRecord, AnswerSheet, AnswerStore};
pub use catalog::{Catalog, CatalogError};
pub use domain::{ChecklistItem, ItemId, Level, LevelSelection, Sheet, UserId};
pub use filter::CatalogFilter;
pub use router::{skillcheck_router, ApiState};
pub use scoring::{score, Aggregation, AggregateResult};
pub use service::{ChecklistEntry, ServiceError, SkillCheckService};
