//! Error types for wise-builder operations.
//!
//! Validation failures are not errors in this sense: they are returned as a
//! [`ValidationError`](crate::ValidationError) tree.  The enums here cover the things that stop
//! an operation outright.

use std::io;

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors produced while parsing an ISO-8601 style duration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    /// The input was empty.
    #[error("duration string is empty")]
    Empty,
    /// The input did not contain the `P` designator.
    #[error("duration must start with 'P' (optionally signed)")]
    MissingDesignator,
    /// A number could not be parsed.
    #[error("invalid number '{0}' in duration")]
    InvalidNumber(String),
    /// A unit character was not valid in its position.
    #[error("unexpected unit '{0}' in duration")]
    UnexpectedUnit(char),
    /// A unit appeared twice.
    #[error("unit '{0}' appears more than once")]
    DuplicateUnit(char),
    /// A number was not followed by a unit.
    #[error("number without a unit at the end of the duration")]
    DanglingNumber,
    /// The `P` designator was not followed by any component.
    #[error("duration has no components")]
    NoComponents,
    /// A `T` designator was not followed by any time component.
    #[error("time designator 'T' without any time component")]
    EmptyTimeSection,
    /// Only seconds may carry a fractional part.
    #[error("only seconds may have a fractional part")]
    FractionalComponent,
}

/// Errors produced when registering a file attachment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    /// The requested attachment name fails the filename safety rule.
    #[error("'{0}' is not a safe attachment filename")]
    UnsafeFilename(String),
}

/// Errors produced by the job assembler.
#[derive(Debug, Clone, Error)]
pub enum JobError {
    /// The job failed validation; the tree describes every problem.
    #[error("job is invalid ({} top-level validation errors)", .0.len())]
    Invalid(Vec<ValidationError>),
    /// A stream was added to a station id that is not part of the job.
    #[error("no weather station with id '{0}'")]
    UnknownWeatherStation(String),
    /// An attachment could not be added.
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

/// Errors produced by a transport [`Session`](crate::Session).
#[derive(Debug, Error)]
pub enum SessionError {
    /// A request was started while another one on the same session was still in flight.
    #[error("a request is already in flight on this session")]
    InFlight,
    /// The socket could not be connected.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// The `host:port` that was dialled.
        address: String,
        /// The underlying socket error.
        #[source]
        source: io::Error,
    },
    /// A socket error after the connection was established.
    #[error("network error: {0}")]
    Io(#[from] io::Error),
    /// The backend closed the connection before sending a job name.
    #[error("connection closed before the backend returned a job name")]
    ConnectionClosed,
    /// The job could not be prepared for submission.
    #[error(transparent)]
    Job(#[from] JobError),
}

/// Errors produced while loading client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),
    /// The file is neither valid JSON nor valid YAML.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    /// An environment variable held an unusable port.
    #[error("invalid port '{0}'")]
    InvalidPort(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_job_reports_count() {
        let err = JobError::Invalid(vec![
            ValidationError::new("timezone", "not set"),
            ValidationError::new("scenarios", "at least one scenario is required"),
        ]);
        assert_eq!(err.to_string(), "job is invalid (2 top-level validation errors)");
    }

    #[test]
    fn session_error_wraps_job_error() {
        let err: SessionError = JobError::UnknownWeatherStation("wthrstn9".to_string()).into();
        assert_eq!(err.to_string(), "no weather station with id 'wthrstn9'");
    }
}
