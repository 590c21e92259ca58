//! Incremental LOC accounting

mod crawler;
mod reconcile;
mod recovery;

use thiserror::Error;

use crate::cache::CacheError;
use crate::github::ApiError;

pub use crawler::{Accumulator, CrawlFailure, crawl_history};
pub use reconcile::{LocSummary, Reconciler};
pub use recovery::RecoveryWriter;

/// Errors that abort a reconciliation pass.
#[derive(Error, Debug)]
pub enum StatsError {
    /// A remote call failed. Rows reconciled before the failure have been saved.
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}
