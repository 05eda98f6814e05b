//! # Error Extensions for Handled
//!
//! This module extends the library's error types to implement
//! Handle<UserError> for consistent error property extraction.

use super::errors::UserError;
use crate::{ConfigError, JobError, SessionError, leaf_errors};
use handled::Handle;

/// Implement Handle<UserError> for JobError
impl Handle<UserError> for JobError {
    fn handle(&self) -> Option<UserError> {
        let (message, hint) = match self {
            JobError::Invalid(errors) => {
                let leaves = leaf_errors(errors);
                let mut message = format!("job has {} validation problem(s)", leaves.len());
                for leaf in &leaves {
                    message.push_str(&format!("\n  {}: {}", leaf.path, leaf.error.message));
                }
                (
                    message,
                    Some("Run 'wisectl job validate <file>' for the full report".to_string()),
                )
            }
            JobError::UnknownWeatherStation(_) => (
                self.to_string(),
                Some("Add the station before adding streams to it".to_string()),
            ),
            JobError::Attachment(_) => (
                self.to_string(),
                Some(
                    "Attachment names may not contain \\ / : * ? \" < > |, start with '.', \
                     or be a reserved device name"
                        .to_string(),
                ),
            ),
        };
        Some(UserError {
            message,
            usage_hint: hint,
        })
    }
}

/// Implement Handle<UserError> for SessionError
impl Handle<UserError> for SessionError {
    fn handle(&self) -> Option<UserError> {
        match self {
            SessionError::Job(err) => err.handle(),
            SessionError::Connect { address, .. } => {
                Some(UserError::new(self.to_string()).with_hint(format!(
                    "Check that the WISE builder is listening on {} or pass --address/--port",
                    address
                )))
            }
            SessionError::ConnectionClosed => Some(
                UserError::new(self.to_string())
                    .with_hint("The builder may have rejected the job; check its log"),
            ),
            SessionError::InFlight | SessionError::Io(_) => Some(UserError::new(self.to_string())),
        }
    }
}

/// Implement Handle<UserError> for ConfigError
impl Handle<UserError> for ConfigError {
    fn handle(&self) -> Option<UserError> {
        let hint = match self {
            ConfigError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Some("The specified file was not found. Check the file path.".to_string())
            }
            ConfigError::Io(_) => None,
            ConfigError::Parse(_) => {
                Some("Use a .json, .yaml or .yml file with valid contents".to_string())
            }
            ConfigError::InvalidPort(_) => Some("Ports are integers from 1 to 65535".to_string()),
        };
        Some(UserError {
            message: self.to_string(),
            usage_hint: hint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    #[test]
    fn invalid_job_lists_leaf_paths() {
        let err = JobError::Invalid(vec![ValidationError::parent(
            "scenarios",
            "scenarios contains invalid values",
            vec![ValidationError::new("0", "bad").with_object("scen0")],
        )]);
        let user = err.handle().unwrap();
        assert_eq!(user.message, "job has 1 validation problem(s)\n  scenarios[0]: bad");
        assert!(user.usage_hint.is_some());
    }

    #[test]
    fn session_wraps_job_errors() {
        let err = SessionError::Job(JobError::UnknownWeatherStation("wthrstn1".to_string()));
        let user = err.handle().unwrap();
        assert_eq!(user.message, "no weather station with id 'wthrstn1'");
    }

    #[test]
    fn missing_config_file_hint() {
        let err = ConfigError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.handle().unwrap().usage_hint.unwrap().contains("not found"));
    }
}
