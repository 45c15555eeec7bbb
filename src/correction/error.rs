//! Errors of the correction pipeline and their HTTP shape.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::provider::ProviderError;

/// Pipeline step an internal failure happened in. Reported as `function`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    EnsureCanonical,
    BeginMerge,
    LoadPlaceholder,
    LockMovies,
    PurgeAttachments,
    ReassignFacts,
    DeletePlaceholder,
    CommitMerge,
    Fetch,
    Upsert,
    Backfill,
    Lookup,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::EnsureCanonical => "resolver::ensure_canonical_row",
            Stage::BeginMerge => "merge::begin",
            Stage::LoadPlaceholder => "merge::load_placeholder",
            Stage::LockMovies => "merge::lock_movies",
            Stage::PurgeAttachments => "merge::purge_attachments",
            Stage::ReassignFacts => "merge::reassign_facts",
            Stage::DeletePlaceholder => "merge::delete_placeholder",
            Stage::CommitMerge => "merge::commit",
            Stage::Fetch => "enrichment::fetch",
            Stage::Upsert => "enrichment::upsert",
            Stage::Backfill => "backfill::localized_title",
            Stage::Lookup => "resolver::lookup",
        }
    }
}

#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("{message}")]
    InvalidArgument {
        message: String,
        hint: Option<String>,
        got: Option<Value>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    /// Failure inside the merge transaction. Everything was rolled back.
    #[error("Merge transaction failed: {source:#}")]
    Transaction {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    /// Provider failure after the merge committed.
    #[error("External fetch for movie {movie_id} failed: {source}")]
    ExternalFetch {
        movie_id: i64,
        #[source]
        source: ProviderError,
    },

    /// Store failure outside the merge transaction.
    #[error("Persistence failed: {source:#}")]
    Persistence {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

/// JSON body of every error response.
#[derive(Debug, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub got: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ErrorResponse {
    fn message(error: String) -> Self {
        Self {
            error,
            hint: None,
            got: None,
            details: None,
            constraint: None,
            code: None,
            function: None,
            timestamp: None,
        }
    }
}

/// Constraint name and result code of the first SQLite error in the chain.
fn sqlite_diagnostics(error: &anyhow::Error) -> (Option<String>, Option<String>) {
    let Some(sqlite_error) = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<rusqlite::Error>())
    else {
        return (None, None);
    };
    match sqlite_error {
        rusqlite::Error::SqliteFailure(failure, message) => {
            let constraint = message
                .as_deref()
                .filter(|m| m.contains("constraint"))
                .map(|m| m.to_string());
            let code = sqlite_code_name(failure.extended_code)
                .map(str::to_string)
                .unwrap_or_else(|| failure.extended_code.to_string());
            (constraint, Some(code))
        }
        _ => (None, None),
    }
}

/// Names of the extended result codes a merge or upsert can plausibly hit.
fn sqlite_code_name(extended_code: i32) -> Option<&'static str> {
    let name = match extended_code {
        5 => "SQLITE_BUSY",
        6 => "SQLITE_LOCKED",
        8 => "SQLITE_READONLY",
        275 => "SQLITE_CONSTRAINT_CHECK",
        787 => "SQLITE_CONSTRAINT_FOREIGNKEY",
        1299 => "SQLITE_CONSTRAINT_NOTNULL",
        1555 => "SQLITE_CONSTRAINT_PRIMARYKEY",
        1811 => "SQLITE_CONSTRAINT_TRIGGER",
        2067 => "SQLITE_CONSTRAINT_UNIQUE",
        _ => return None,
    };
    Some(name)
}

impl CorrectionError {
    #[cfg(test)]
    pub fn invalid(message: impl Into<String>) -> Self {
        CorrectionError::InvalidArgument {
            message: message.into(),
            hint: None,
            got: None,
        }
    }

    pub fn transaction(stage: Stage, source: anyhow::Error) -> Self {
        CorrectionError::Transaction { stage, source }
    }

    pub fn persistence(stage: Stage, source: anyhow::Error) -> Self {
        CorrectionError::Persistence { stage, source }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            CorrectionError::InvalidArgument { .. } => 400,
            CorrectionError::NotFound(_) => 404,
            CorrectionError::MethodNotAllowed(_) => 405,
            CorrectionError::Transaction { .. }
            | CorrectionError::ExternalFetch { .. }
            | CorrectionError::Persistence { .. } => 500,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CorrectionError::InvalidArgument { .. } => "invalid_argument",
            CorrectionError::NotFound(_) => "not_found",
            CorrectionError::MethodNotAllowed(_) => "method_not_allowed",
            CorrectionError::Transaction { .. } => "transaction",
            CorrectionError::ExternalFetch { .. } => "external_fetch",
            CorrectionError::Persistence { .. } => "persistence",
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            CorrectionError::Transaction { stage, .. }
            | CorrectionError::Persistence { stage, .. } => Some(*stage),
            CorrectionError::ExternalFetch { .. } => Some(Stage::Fetch),
            _ => None,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        match self {
            CorrectionError::InvalidArgument { message, hint, got } => ErrorResponse {
                hint: hint.clone(),
                got: got.clone(),
                ..ErrorResponse::message(message.clone())
            },
            CorrectionError::NotFound(message) => ErrorResponse::message(message.clone()),
            CorrectionError::MethodNotAllowed(_) => ErrorResponse::message(self.to_string()),
            CorrectionError::Transaction { source, .. }
            | CorrectionError::Persistence { source, .. } => {
                let (constraint, code) = sqlite_diagnostics(source);
                self.internal_response(format!("{:#}", source), constraint, code)
            }
            CorrectionError::ExternalFetch { source, .. } => self.internal_response(
                source.to_string(),
                None,
                source.status().map(|s| s.to_string()),
            ),
        }
    }

    fn internal_response(
        &self,
        details: String,
        constraint: Option<String>,
        code: Option<String>,
    ) -> ErrorResponse {
        let error = match self {
            CorrectionError::Transaction { .. } => "Merge transaction failed",
            CorrectionError::ExternalFetch { .. } => "External metadata fetch failed",
            _ => "Persistence failed",
        };
        ErrorResponse {
            details: Some(details),
            constraint,
            code,
            function: self.stage().map(|s| s.as_str().to_string()),
            timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            ..ErrorResponse::message(error.to_string())
        }
    }
}
