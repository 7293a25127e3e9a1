use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod escape;
pub mod form;
pub mod notice;
pub mod poller;
pub mod view;

pub use api::{HttpSubmissionsClient, SubmissionsApi, SubmitReceipt};
pub use config::{load_client_settings, ClientSettings};
pub use error::{ApiCallError, ConfigError, FormError};
pub use form::{FormController, SubmitOutcome};
pub use notice::NoticeRenderer;
pub use poller::{ListPoller, PollerHandle};
pub use view::{FormFields, ListContent, NoticeKind, PageView, ViewState};

/// The submissions page wired together: one view state shared by the form
/// controller, the notice renderer and the list poller.
pub struct SubmissionsPage {
    pub view: ViewState,
    pub api: Arc<dyn SubmissionsApi>,
    pub notices: NoticeRenderer,
    pub poller: Arc<ListPoller>,
    pub form: FormController,
    settings: ClientSettings,
}

impl SubmissionsPage {
    pub fn new(api: Arc<dyn SubmissionsApi>, settings: ClientSettings) -> Self {
        let view = ViewState::new();
        let notices = NoticeRenderer::new(view.clone(), settings.notice_ttl);
        let poller = Arc::new(ListPoller::new(Arc::clone(&api), view.clone()));
        let form = FormController::new(
            Arc::clone(&api),
            view.clone(),
            notices.clone(),
            Arc::clone(&poller),
        );
        Self {
            view,
            api,
            notices,
            poller,
            form,
            settings,
        }
    }

    /// Builds the page over the HTTP client described by `settings`.
    pub fn connect(settings: ClientSettings) -> Result<Self, ConfigError> {
        let api = HttpSubmissionsClient::from_settings(&settings)?;
        Ok(Self::new(Arc::new(api), settings))
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Starts periodic refresh (the first one runs immediately). Dropping the
    /// handle stops the timer.
    pub fn start(&self) -> PollerHandle {
        self.poller.spawn(self.settings.poll_interval)
    }

    /// Fills the form and submits it, as a user typing and pressing submit.
    pub async fn submit_form(&self, fields: FormFields) -> SubmitOutcome {
        self.view.set_form(fields);
        self.form.submit().await
    }
}

#[cfg(test)]
#[path = "tests/fake_api.rs"]
mod fake_api;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
