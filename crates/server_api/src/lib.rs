use chrono::NaiveDate;
use serde_json::{Map, Value};
use shared::{
    domain::{Submission, SubmissionId, EVENT_DATE_FORMAT},
    error::{ApiError, ErrorCode},
    protocol::{HealthResponse, SubmitResponse},
};
use storage::Storage;
use tracing::{info, warn};

pub const MIN_AGE: i64 = 0;
pub const MAX_AGE: i64 = 150;
pub const MAX_NAME_CHARS: usize = 100;

pub const MSG_NOT_AN_OBJECT: &str = "Request body must be a JSON object";
pub const MSG_MISSING_FIELDS: &str = "Missing required fields";
pub const MSG_NAME_NOT_TEXT: &str = "Name must be text";
pub const MSG_NAME_TOO_LONG: &str = "Name must be at most 100 characters";
pub const MSG_AGE_NOT_NUMBER: &str = "Age must be a valid number";
pub const MSG_AGE_OUT_OF_RANGE: &str = "Age must be between 0 and 150";
pub const MSG_BAD_DATE: &str = "Invalid date format. Use YYYY-MM-DD";
pub const MSG_NOT_FOUND: &str = "Submission not found";
pub const MSG_CREATED: &str = "Submission successful";

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub user_name: String,
    pub user_age: i64,
    pub event_date: NaiveDate,
}

/// Validates a raw create-submission body. Field presence is checked before
/// any field is interpreted, so a body missing several fields always reports
/// the missing-fields message.
pub fn validate_submission(body: &[u8]) -> Result<ValidSubmission, ApiError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| ApiError::validation(MSG_NOT_AN_OBJECT))?;
    let Value::Object(fields) = value else {
        return Err(ApiError::validation(MSG_NOT_AN_OBJECT));
    };

    let (Some(name), Some(age), Some(date)) = (
        present(&fields, "user_name"),
        present(&fields, "user_age"),
        present(&fields, "event_date"),
    ) else {
        return Err(ApiError::validation(MSG_MISSING_FIELDS));
    };

    let user_name = name
        .as_str()
        .map(str::trim)
        .ok_or_else(|| ApiError::validation(MSG_NAME_NOT_TEXT))?;
    if user_name.chars().count() > MAX_NAME_CHARS {
        return Err(ApiError::validation(MSG_NAME_TOO_LONG));
    }

    let user_age = parse_age(age).ok_or_else(|| ApiError::validation(MSG_AGE_NOT_NUMBER))?;
    if !(MIN_AGE..=MAX_AGE).contains(&user_age) {
        return Err(ApiError::validation(MSG_AGE_OUT_OF_RANGE));
    }

    let event_date = date
        .as_str()
        .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), EVENT_DATE_FORMAT).ok())
        .ok_or_else(|| ApiError::validation(MSG_BAD_DATE))?;

    Ok(ValidSubmission {
        user_name: user_name.to_string(),
        user_age,
        event_date,
    })
}

/// `null`, absent and blank strings all count as missing.
fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => Some(other),
    }
}

/// Integers are taken as-is, finite floats are truncated and numeric strings
/// are parsed after trimming.
fn parse_age(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub async fn create_submission(ctx: &ApiContext, body: &[u8]) -> Result<SubmitResponse, ApiError> {
    let valid = validate_submission(body).inspect_err(|err| {
        info!(reason = %err.message, "rejected submission");
    })?;
    let stored = ctx
        .storage
        .insert_submission(&valid.user_name, valid.user_age, valid.event_date)
        .await
        .map_err(internal)?;
    info!(submission_id = stored.id.0, "stored submission");
    Ok(SubmitResponse {
        message: MSG_CREATED.to_string(),
        submission: stored.into(),
    })
}

pub async fn list_submissions(ctx: &ApiContext) -> Result<Vec<Submission>, ApiError> {
    let stored = ctx.storage.list_submissions().await.map_err(internal)?;
    Ok(stored.into_iter().map(Submission::from).collect())
}

pub async fn get_submission(ctx: &ApiContext, id: SubmissionId) -> Result<Submission, ApiError> {
    ctx.storage
        .load_submission(id)
        .await
        .map_err(internal)?
        .map(Submission::from)
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, MSG_NOT_FOUND))
}

pub async fn health(ctx: &ApiContext) -> Result<HealthResponse, ApiError> {
    ctx.storage.health_check().await.map_err(|err| {
        warn!(error = %err, "health check failed");
        ApiError::new(ErrorCode::Unavailable, err.to_string())
    })?;
    Ok(HealthResponse::healthy())
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}
