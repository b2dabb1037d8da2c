//! EnergyLens - energy and production analytics for manufacturing lines.
//!
//! The library loads a tabular line dataset into an immutable
//! [`dataset::Dataset`], aggregates it ([`analysis`]), derives rule-based
//! insights ([`insights`]) and builds the efficiency report with its
//! delimited export ([`report`]).
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use energylens::insights::{derive_insights, InsightRules};
//! use energylens::loader::{load_dataset, LoadOptions};
//!
//! let dataset = load_dataset("plant.csv", &LoadOptions::default()).await?;
//! for insight in derive_insights(dataset.records(), &InsightRules::standard()) {
//!     println!("{}", insight.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod format;
pub mod insights;
pub mod loader;
pub mod models;
pub mod report;
