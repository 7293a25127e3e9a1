use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{
    api::SubmissionsApi,
    error::ApiCallError,
    view::{ListContent, ViewState},
};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Fetches the full submissions list and replaces the rendered list with it.
pub struct ListPoller {
    api: Arc<dyn SubmissionsApi>,
    view: ViewState,
}

impl ListPoller {
    pub fn new(api: Arc<dyn SubmissionsApi>, view: ViewState) -> Self {
        Self { api, view }
    }

    /// One read of the list endpoint. The view is updated on every outcome;
    /// the returned value is the number of records rendered.
    ///
    /// Overlapping calls are not serialized: whichever response lands last
    /// determines the rendered list.
    pub async fn refresh(&self) -> Result<usize, ApiCallError> {
        match self.api.list_submissions().await {
            Ok(records) => {
                let count = records.len();
                debug!(count, "submissions refreshed");
                self.view.replace_list(ListContent::from_records(records));
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, "failed to load submissions");
                self.view.replace_list(ListContent::Failed);
                Err(err)
            }
        }
    }

    /// Refreshes immediately and then every `every` until the returned handle
    /// is stopped or dropped. Each tick runs its refresh as its own task so a
    /// hung request never delays the next tick.
    pub fn spawn(self: &Arc<Self>, every: Duration) -> PollerHandle {
        let poller = Arc::clone(self);
        let every = every.max(MIN_POLL_INTERVAL);
        let task = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let poller = Arc::clone(&poller);
                tokio::spawn(async move {
                    let _ = poller.refresh().await;
                });
            }
        });
        PollerHandle { task }
    }
}

/// Owns the poll timer. Requests already in flight are left to finish.
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;
