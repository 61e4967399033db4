// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Errors raised by the server store, the cipher, and the agent client.
///
/// Variants carry causes, not presentation text. Callers decide how to word
/// them for the operator.
#[derive(Debug)]
pub enum HubError {
    /// A server with this nickname already exists for the tenant.
    AlreadyExists { nickname: String },
    /// The tenant has no servers (or no selection at all).
    NoServers,
    /// The tenant's selection points at a record that is missing.
    NoCurrentServer,
    UnknownTenant,
    UnknownServer { nickname: String },
    /// Rejected input (empty nickname, empty URL, ...).
    InvalidInput(String),
    /// Stored credential token is not valid base64.
    Decode(base64::DecodeError),
    /// Stored credential token is shorter than one IV.
    Format,
    /// Snapshot read or write failed.
    Io(std::io::Error),
    /// Snapshot could not be serialized or parsed.
    Snapshot(serde_json::Error),
    /// Request to the update agent failed below HTTP.
    Transport(reqwest::Error),
    Authentication,
    ServiceUnavailable { status: u16 },
    UnexpectedStatus { status: u16 },
    /// The update agent answered with a body we could not decode.
    InvalidResponse(String),
}

impl HubError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::NoServers => "NO_SERVERS",
            Self::NoCurrentServer => "NO_CURRENT_SERVER",
            Self::UnknownTenant => "UNKNOWN_TENANT",
            Self::UnknownServer { .. } => "UNKNOWN_SERVER",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Decode(_) => "DECODE",
            Self::Format => "FORMAT",
            Self::Io(_) => "IO",
            Self::Snapshot(_) => "SNAPSHOT",
            Self::Transport(_) => "TRANSPORT",
            Self::Authentication => "AUTHENTICATION",
            Self::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            Self::UnexpectedStatus { .. } => "UNEXPECTED_STATUS",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::AlreadyExists { .. } => 409,
            Self::NoServers | Self::NoCurrentServer => 404,
            Self::UnknownTenant | Self::UnknownServer { .. } => 404,
            Self::InvalidInput(_) => 400,
            Self::Decode(_) | Self::Format | Self::Io(_) | Self::Snapshot(_) => 500,
            Self::Transport(_)
            | Self::Authentication
            | Self::UnexpectedStatus { .. }
            | Self::InvalidResponse(_) => 502,
            Self::ServiceUnavailable { .. } => 503,
        }
    }

    /// True for the validation kind: caller mistakes, never fatal.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExists { .. }
                | Self::NoServers
                | Self::NoCurrentServer
                | Self::UnknownTenant
                | Self::UnknownServer { .. }
                | Self::InvalidInput(_)
        )
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody { code: self.code().to_owned(), message: self.to_string() }
    }

    pub fn to_http_response(&self) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse { error: self.to_error_body() }))
    }
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists { nickname } => {
                write!(f, "server with nickname {nickname:?} already exists")
            }
            Self::NoServers => f.write_str("no servers configured"),
            Self::NoCurrentServer => f.write_str("current server not found"),
            Self::UnknownTenant => f.write_str("tenant not found"),
            Self::UnknownServer { nickname } => write!(f, "server {nickname:?} not found"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::Decode(e) => write!(f, "stored credential is not valid base64: {e}"),
            Self::Format => f.write_str("stored credential is too short"),
            Self::Io(e) => write!(f, "snapshot i/o failed: {e}"),
            Self::Snapshot(e) => write!(f, "snapshot is malformed: {e}"),
            Self::Transport(e) => write!(f, "request to update agent failed: {e}"),
            Self::Authentication => f.write_str("authentication failed, check the server token"),
            Self::ServiceUnavailable { status } => {
                write!(f, "update agent unavailable ({status})")
            }
            Self::UnexpectedStatus { status } => {
                write!(f, "update agent returned unexpected status {status}")
            }
            Self::InvalidResponse(msg) => write!(f, "update agent response undecodable: {msg}"),
        }
    }
}

impl std::error::Error for HubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Snapshot(e) => Some(e),
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<base64::DecodeError> for HubError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<std::io::Error> for HubError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for HubError {
    fn from(e: serde_json::Error) -> Self {
        Self::Snapshot(e)
    }
}

impl From<reqwest::Error> for HubError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
