//! Request generations
//!
//! A new query supersedes any query still in flight. Each search is stamped
//! with a generation from a monotonically increasing counter; a stamped result
//! is settled only while its generation is the latest one issued.

use crate::models::Coordinate;
use crate::pipeline::SearchPipeline;
use crate::{Result, models::SearchOutcome};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Instrument, debug, info_span};

/// Sequence number of one search
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A value produced on behalf of one generation
#[derive(Debug)]
pub struct Stamped<T> {
    pub generation: Generation,
    pub value: T,
}

/// Issues generations and discards superseded results
#[derive(Clone)]
pub struct SearchSession {
    pipeline: Arc<SearchPipeline>,
    latest: Arc<AtomicU64>,
}

impl SearchSession {
    #[must_use]
    pub fn new(pipeline: Arc<SearchPipeline>) -> Self {
        Self {
            pipeline,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Issue the next generation, superseding all earlier ones
    pub fn issue(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[must_use]
    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest.load(Ordering::SeqCst) == generation.0
    }

    /// Unwrap a stamped value if it is still current
    pub fn settle<T>(&self, stamped: Stamped<T>) -> Option<T> {
        if self.is_current(stamped.generation) {
            Some(stamped.value)
        } else {
            debug!(generation = %stamped.generation, "Discarding superseded result");
            None
        }
    }

    /// Run a search under a fresh generation
    pub async fn search(
        &self,
        query: &str,
        reference: Option<Coordinate>,
    ) -> Stamped<Result<Option<SearchOutcome>>> {
        let generation = self.issue();
        let span = info_span!("search", generation = generation.value());
        let value = self
            .pipeline
            .search(query, reference)
            .instrument(span)
            .await;
        Stamped { generation, value }
    }
}
