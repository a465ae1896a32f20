//! Log record formats
//!
//! Upstream form handling validates input; these types only turn an already
//! validated record into its single log line.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::Result;

/// A record that can be appended to a remote log
pub trait LogRecord {
    /// The record rendered as one log line (no trailing newline)
    fn to_line(&self) -> Result<String>;

    /// Who the record belongs to, for the remote change message
    fn actor(&self) -> &str;
}

/// Newsletter signup, logged as `email,timestamp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signup {
    /// Subscriber email address
    pub email: String,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
}

impl Signup {
    /// Create a signup stamped with the current time
    pub fn now(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            submitted_at: Utc::now(),
        }
    }
}

impl LogRecord for Signup {
    fn to_line(&self) -> Result<String> {
        Ok(format!(
            "{},{}",
            self.email,
            self.submitted_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ))
    }

    fn actor(&self) -> &str {
        &self.email
    }
}

/// Contact form message, logged as one JSON object per line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    /// Sender name
    pub name: String,
    /// Sender email address
    pub email: String,
    /// Message body (may span lines; JSON escaping keeps it on one)
    pub message: String,
    /// Submission time
    #[serde(serialize_with = "serialize_rfc3339")]
    pub submitted_at: DateTime<Utc>,
}

impl ContactMessage {
    /// Create a contact message stamped with the current time
    pub fn now(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
            submitted_at: Utc::now(),
        }
    }
}

impl LogRecord for ContactMessage {
    fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn actor(&self) -> &str {
        &self.email
    }
}

fn serialize_rfc3339<S>(at: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
}
