//! The page's view state: form fields, submit control, notice slot and the
//! rendered submissions list. One [`ViewState`] is created at startup and
//! shared by the form controller, the notice renderer and the list poller.

use std::{
    fmt::Write as _,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::domain::Submission;
use tokio::sync::watch;
use v_htmlescape::escape;

use crate::escape::sanitize_terminal;

pub const SUBMIT_LABEL: &str = "Submit";
pub const SUBMITTING_LABEL: &str = "Submitting...";
pub const EMPTY_LIST_TEXT: &str = "No submissions yet. Be the first to submit!";
pub const LIST_ERROR_TEXT: &str = "Error loading submissions";
const LOADING_LIST_TEXT: &str = "Loading submissions...";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub user_name: String,
    pub user_age: String,
    pub event_date: String,
}

impl FormFields {
    pub fn new(
        user_name: impl Into<String>,
        user_age: impl Into<String>,
        event_date: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            user_age: user_age.into(),
            event_date: event_date.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub enabled: bool,
    pub label: String,
}

impl SubmitControl {
    fn idle() -> Self {
        Self {
            enabled: true,
            label: SUBMIT_LABEL.to_string(),
        }
    }

    fn submitting() -> Self {
        Self {
            enabled: false,
            label: SUBMITTING_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Distinguishes successive notices so a stale clear timer can tell it
    /// has been superseded.
    pub id: u64,
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListContent {
    /// Nothing has been fetched yet.
    #[default]
    Loading,
    Empty,
    Failed,
    Records(Vec<Submission>),
}

impl ListContent {
    pub fn from_records(records: Vec<Submission>) -> Self {
        if records.is_empty() {
            ListContent::Empty
        } else {
            ListContent::Records(records)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub form: FormFields,
    pub submit: SubmitControl,
    pub notice: Option<Notice>,
    pub list: ListContent,
}

impl Default for PageView {
    fn default() -> Self {
        Self {
            form: FormFields::default(),
            submit: SubmitControl::idle(),
            notice: None,
            list: ListContent::default(),
        }
    }
}

impl PageView {
    pub fn notice_markup(&self) -> String {
        match &self.notice {
            Some(notice) => format!(
                r#"<div class="message {}">{}</div>"#,
                notice.kind.as_str(),
                escape(&notice.text)
            ),
            None => String::new(),
        }
    }

    pub fn submit_markup(&self) -> String {
        if self.submit.enabled {
            format!(
                r#"<button type="submit" id="submitBtn">{}</button>"#,
                escape(&self.submit.label)
            )
        } else {
            format!(
                r#"<button type="submit" id="submitBtn" disabled><span class="loading"></span> {}</button>"#,
                escape(&self.submit.label)
            )
        }
    }

    /// Every field, including the service-assigned timestamp, is escaped.
    pub fn list_markup(&self) -> String {
        match &self.list {
            ListContent::Loading => {
                format!(r#"<div class="empty-message">{LOADING_LIST_TEXT}</div>"#)
            }
            ListContent::Empty => format!(r#"<div class="empty-message">{EMPTY_LIST_TEXT}</div>"#),
            ListContent::Failed => format!(r#"<div class="empty-message">{LIST_ERROR_TEXT}</div>"#),
            ListContent::Records(records) => {
                let mut out = String::new();
                for record in records {
                    let _ = write!(
                        out,
                        concat!(
                            r#"<div class="submission-item">"#,
                            "<h4>👤 {}</h4>",
                            "<p><strong>Age:</strong> {} years</p>",
                            "<p><strong>Event Date:</strong> {}</p>",
                            r#"<p class="timestamp">📅 Submitted: {}</p>"#,
                            "</div>"
                        ),
                        escape(&record.user_name),
                        record.user_age,
                        escape(&record.event_date),
                        escape(&record.submitted_at),
                    );
                }
                out
            }
        }
    }

    pub fn form_markup(&self) -> String {
        format!(
            concat!(
                r#"<form id="submissionForm">"#,
                r#"<input type="text" id="userName" value="{}">"#,
                r#"<input type="number" id="userAge" value="{}">"#,
                r#"<input type="date" id="eventDate" value="{}">"#,
                "{}",
                "</form>"
            ),
            escape(&self.form.user_name),
            escape(&self.form.user_age),
            escape(&self.form.event_date),
            self.submit_markup(),
        )
    }

    /// Standalone document that reloads itself every `refresh_secs`.
    pub fn render_document(&self, refresh_secs: u64) -> String {
        format!(
            concat!(
                "<!DOCTYPE html>\n",
                r#"<html lang="en"><head><meta charset="utf-8">"#,
                r#"<meta http-equiv="refresh" content="{}">"#,
                "<title>Event Submissions</title></head><body>",
                r#"<div id="message">{}</div>"#,
                "{}",
                r#"<div id="submissionsList">{}</div>"#,
                "</body></html>\n"
            ),
            refresh_secs,
            self.notice_markup(),
            self.form_markup(),
            self.list_markup(),
        )
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if let Some(notice) = &self.notice {
            let _ = writeln!(
                out,
                "[{}] {}",
                notice.kind.as_str(),
                sanitize_terminal(&notice.text)
            );
        }
        let _ = writeln!(out, "[{}]", self.submit.label);
        match &self.list {
            ListContent::Loading => {
                let _ = writeln!(out, "{LOADING_LIST_TEXT}");
            }
            ListContent::Empty => {
                let _ = writeln!(out, "{EMPTY_LIST_TEXT}");
            }
            ListContent::Failed => {
                let _ = writeln!(out, "{LIST_ERROR_TEXT}");
            }
            ListContent::Records(records) => {
                for record in records {
                    let _ = writeln!(
                        out,
                        "- {} ({} years) event {} submitted {}",
                        sanitize_terminal(&record.user_name),
                        record.user_age,
                        sanitize_terminal(&record.event_date),
                        sanitize_terminal(&record.submitted_at),
                    );
                }
            }
        }
        out
    }
}

struct ViewInner {
    page: PageView,
    next_notice_id: u64,
    revision: u64,
}

/// Shared handle to the page view. Every mutation happens under one short
/// lock and bumps a revision that subscribers can wait on.
#[derive(Clone)]
pub struct ViewState {
    inner: Arc<Mutex<ViewInner>>,
    changes: watch::Sender<u64>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(ViewInner {
                page: PageView::default(),
                next_notice_id: 1,
                revision: 0,
            })),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, apply: impl FnOnce(&mut ViewInner) -> R) -> R {
        let mut guard = self.lock();
        let result = apply(&mut guard);
        guard.revision += 1;
        // Published under the lock so subscribers see revisions in order.
        self.changes.send_replace(guard.revision);
        result
    }

    pub fn snapshot(&self) -> PageView {
        self.lock().page.clone()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Receiver whose value is the latest revision.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn form(&self) -> FormFields {
        self.lock().page.form.clone()
    }

    pub fn set_form(&self, form: FormFields) {
        self.update(|inner| inner.page.form = form);
    }

    pub fn reset_form(&self) {
        self.update(|inner| inner.page.form = FormFields::default());
    }

    pub fn is_submitting(&self) -> bool {
        !self.lock().page.submit.enabled
    }

    /// Disables the submit control. Returns `false` when it already was.
    pub fn try_begin_submit(&self) -> bool {
        {
            let guard = self.lock();
            if !guard.page.submit.enabled {
                return false;
            }
        }
        self.update(|inner| {
            if !inner.page.submit.enabled {
                return false;
            }
            inner.page.submit = SubmitControl::submitting();
            true
        })
    }

    pub fn end_submit(&self) {
        self.update(|inner| inner.page.submit = SubmitControl::idle());
    }

    /// Replaces whatever notice is showing and returns the new notice's id.
    pub fn show_notice(&self, kind: NoticeKind, text: impl Into<String>) -> u64 {
        let text = text.into();
        self.update(|inner| {
            let id = inner.next_notice_id;
            inner.next_notice_id += 1;
            inner.page.notice = Some(Notice { id, kind, text });
            id
        })
    }

    /// Clears the notice only if it is still the one identified by `id`.
    pub fn clear_notice(&self, id: u64) -> bool {
        {
            let guard = self.lock();
            if guard.page.notice.as_ref().map(|n| n.id) != Some(id) {
                return false;
            }
        }
        self.update(|inner| match &inner.page.notice {
            Some(notice) if notice.id == id => {
                inner.page.notice = None;
                true
            }
            _ => false,
        })
    }

    /// Replaces the rendered list wholesale.
    pub fn replace_list(&self, list: ListContent) {
        self.update(|inner| inner.page.list = list);
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
