use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(SubmissionId);

/// Date layout accepted for `event_date` and used when serializing it.
pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";
/// Layout of the server-assigned `submitted_at` text.
pub const SUBMITTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A submission as the service reports it. Dates are carried as the service's
/// text so clients can display them without interpreting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SubmissionId>,
    pub user_name: String,
    pub user_age: i64,
    pub event_date: String,
    pub submitted_at: String,
}

/// Body of a create-submission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubmission {
    pub user_name: String,
    pub user_age: i64,
    pub event_date: String,
}
