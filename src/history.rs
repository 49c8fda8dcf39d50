//! Fire-and-forget search history

use crate::Result;
use crate::models::IntentKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub subject_text: String,
    pub intent_kind: IntentKind,
    pub timestamp: DateTime<Utc>,
}

/// Receiver of classified queries
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn record(&self, entry: HistoryEntry) -> Result<()>;
}

/// Hand an entry to the sink on a detached task; failures are only logged
pub fn dispatch(sink: &Arc<dyn HistorySink>, entry: HistoryEntry) {
    let sink = sink.clone();
    tokio::spawn(async move {
        if let Err(e) = sink.record(entry).await {
            warn!("Failed to record search history: {}", e);
        }
    });
}

/// Emits each entry as a structured log event
pub struct LogHistorySink;

#[async_trait]
impl HistorySink for LogHistorySink {
    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        info!(
            subject = %entry.subject_text,
            intent = %entry.intent_kind,
            timestamp = %entry.timestamp,
            "Search recorded"
        );
        Ok(())
    }
}

/// Bounded in-process history, newest last
pub struct MemoryHistorySink {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl MemoryHistorySink {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Most recent entries first
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.iter().rev().take(limit).cloned().collect()
    }
}

#[async_trait]
impl HistorySink for MemoryHistorySink {
    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        Ok(())
    }
}
