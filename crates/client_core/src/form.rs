use std::sync::Arc;

use shared::domain::NewSubmission;
use tracing::{debug, info, warn};

use crate::{
    api::{SubmissionsApi, SubmitReceipt},
    error::{ApiCallError, FormError},
    notice::NoticeRenderer,
    poller::ListPoller,
    view::{FormFields, ViewState},
};

pub const SUCCESS_TEXT: &str = "✓ Submission successful!";

impl FormFields {
    /// Trims every field, requires all three, and parses the age as a
    /// base-10 integer.
    pub fn validate(&self) -> Result<NewSubmission, FormError> {
        let user_name = self.user_name.trim();
        let user_age = self.user_age.trim();
        let event_date = self.event_date.trim();
        if user_name.is_empty() || user_age.is_empty() || event_date.is_empty() {
            return Err(FormError::MissingFields);
        }
        let user_age = user_age
            .parse::<i64>()
            .map_err(|_| FormError::InvalidAge)?;
        Ok(NewSubmission {
            user_name: user_name.to_string(),
            user_age,
            event_date: event_date.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Rejected before any request was made.
    Invalid(FormError),
    /// A submission was already in flight.
    Busy,
    Accepted(SubmitReceipt),
    Rejected { status: u16, message: String },
    NetworkFailure(String),
}

/// Re-enables the submit control when dropped, whichever way the submit
/// future finishes (including being dropped mid-request).
struct SubmittingGuard<'a> {
    view: &'a ViewState,
}

impl<'a> SubmittingGuard<'a> {
    fn enter(view: &'a ViewState) -> Option<Self> {
        view.try_begin_submit().then_some(Self { view })
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.view.end_submit();
    }
}

pub struct FormController {
    api: Arc<dyn SubmissionsApi>,
    view: ViewState,
    notices: NoticeRenderer,
    poller: Arc<ListPoller>,
}

impl FormController {
    pub fn new(
        api: Arc<dyn SubmissionsApi>,
        view: ViewState,
        notices: NoticeRenderer,
        poller: Arc<ListPoller>,
    ) -> Self {
        Self {
            api,
            view,
            notices,
            poller,
        }
    }

    /// Submits the form fields currently held in the view.
    pub async fn submit(&self) -> SubmitOutcome {
        if self.view.is_submitting() {
            debug!("submit ignored while a submission is in flight");
            return SubmitOutcome::Busy;
        }

        let submission = match self.view.form().validate() {
            Ok(submission) => submission,
            Err(err) => {
                self.notices.error(err.to_string());
                return SubmitOutcome::Invalid(err);
            }
        };

        let Some(submitting) = SubmittingGuard::enter(&self.view) else {
            return SubmitOutcome::Busy;
        };

        let outcome = match self.api.submit(&submission).await {
            Ok(receipt) => {
                info!(status = receipt.status, "submission accepted");
                self.notices.success(SUCCESS_TEXT);
                self.view.reset_form();
                SubmitOutcome::Accepted(receipt)
            }
            Err(ApiCallError::Rejected { status, message }) => {
                warn!(status, %message, "submission rejected");
                self.notices.error(format!("✗ Error: {message}"));
                SubmitOutcome::Rejected { status, message }
            }
            Err(err) => {
                warn!(error = %err, "submission error");
                self.notices.error(format!("✗ Network error: {err}"));
                SubmitOutcome::NetworkFailure(err.to_string())
            }
        };
        drop(submitting);

        if matches!(outcome, SubmitOutcome::Accepted(_)) {
            let _ = self.poller.refresh().await;
        }
        outcome
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
