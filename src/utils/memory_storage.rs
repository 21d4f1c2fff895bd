//! In-memory collaborators for testing

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::traits::*;
use crate::types::*;

fn poisoned<T>(_: T) -> LeaveError {
    LeaveError::Storage("in-memory lock poisoned".to_string())
}

/// In-memory balance source; clones share the same sheet
#[derive(Debug, Clone, Default)]
pub struct MemoryBalanceSource {
    balances: Arc<RwLock<BalanceSheet>>,
}

impl MemoryBalanceSource {
    /// Create a source seeded with the given sheet
    pub fn new(balances: BalanceSheet) -> Self {
        Self {
            balances: Arc::new(RwLock::new(balances)),
        }
    }

    /// Read the most recently stored sheet
    pub fn snapshot(&self) -> LeaveResult<BalanceSheet> {
        Ok(self.balances.read().map_err(poisoned)?.clone())
    }
}

#[async_trait]
impl BalanceSource for MemoryBalanceSource {
    async fn fetch_balances(&self) -> LeaveResult<BalanceSheet> {
        self.snapshot()
    }

    async fn store_balances(&mut self, balances: &BalanceSheet) -> LeaveResult<()> {
        *self.balances.write().map_err(poisoned)? = balances.clone();
        Ok(())
    }
}

/// A submission received by [`MemorySubmitter`]
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Application(LeaveRequest),
    Update(LeaveRequest),
    Cancellation {
        request_id: String,
        remaining: Option<LeaveRequest>,
    },
}

#[derive(Debug, Default)]
struct SubmitterState {
    submissions: Vec<Submission>,
    fail_next: bool,
    delay: Option<Duration>,
}

/// In-memory submitter with failure and latency injection; clones share state
#[derive(Debug, Clone, Default)]
pub struct MemorySubmitter {
    state: Arc<RwLock<SubmitterState>>,
}

impl MemorySubmitter {
    /// Create a submitter that accepts everything immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next submission fail
    pub fn fail_next(&self) {
        if let Ok(mut state) = self.state.write() {
            state.fail_next = true;
        }
    }

    /// Delay every submission by `delay`
    pub fn set_delay(&self, delay: Option<Duration>) {
        if let Ok(mut state) = self.state.write() {
            state.delay = delay;
        }
    }

    /// Everything accepted so far, oldest first
    pub fn submissions(&self) -> Vec<Submission> {
        self.state
            .read()
            .map(|state| state.submissions.clone())
            .unwrap_or_default()
    }

    async fn record(&self, submission: Submission) -> LeaveResult<()> {
        let delay = self.state.read().map_err(poisoned)?.delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().map_err(poisoned)?;
        if state.fail_next {
            state.fail_next = false;
            return Err(LeaveError::Persistence(
                "submission rejected by server".to_string(),
            ));
        }
        state.submissions.push(submission);
        Ok(())
    }
}

#[async_trait]
impl LeaveSubmitter for MemorySubmitter {
    async fn submit_application(&mut self, request: &LeaveRequest) -> LeaveResult<()> {
        self.record(Submission::Application(request.clone())).await
    }

    async fn submit_update(&mut self, request: &LeaveRequest) -> LeaveResult<()> {
        self.record(Submission::Update(request.clone())).await
    }

    async fn submit_cancellation(
        &mut self,
        request_id: &str,
        remaining: Option<&LeaveRequest>,
    ) -> LeaveResult<()> {
        self.record(Submission::Cancellation {
            request_id: request_id.to_string(),
            remaining: remaining.cloned(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_balance_source_clones_share_state() {
        let source = MemoryBalanceSource::new(BalanceSheet::standard_allotment());
        let mut handle = source.clone();

        let mut sheet = handle.fetch_balances().await.unwrap();
        sheet.set(LeaveCategory::Earned, 5);
        handle.store_balances(&sheet).await.unwrap();

        assert_eq!(source.snapshot().unwrap().get(LeaveCategory::Earned), 5);
    }

    #[tokio::test]
    async fn test_submitter_fails_once() {
        let mut submitter = MemorySubmitter::new();
        submitter.fail_next();

        let first = submitter.submit_cancellation("req-1", None).await;
        assert!(matches!(first, Err(LeaveError::Persistence(_))));

        submitter.submit_cancellation("req-1", None).await.unwrap();
        assert_eq!(submitter.submissions().len(), 1);
    }
}
