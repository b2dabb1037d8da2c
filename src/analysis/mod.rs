//! Aggregation over loaded records.
//!
//! `aggregator` holds the grouping and summing primitives; `views`
//! composes them into the models the dashboard views render.

pub mod aggregator;
pub mod views;

pub use aggregator::*;
pub use views::*;
