//! `mailtrace-matcher` — links a mailing list to a CRM lead list by location.
//!
//! Pure engine crate: receives pre-loaded datasets, returns match records,
//! a flat result table and KPIs. No CLI dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod kpi;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod project;
pub mod schema;

pub use config::MatcherConfig;
pub use engine::{run, Matcher};
pub use error::MatchError;
pub use model::{Dataset, KpiSummary, MatchOutcome, MatchRecord, ResultTable};
pub use schema::DatasetKind;
