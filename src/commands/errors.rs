//! # Command Errors
//!
//! wisectl renders every failure through [`UserError`]: a message plus an optional hint on how
//! to fix it.  Library errors gain a rendering in `error_extensions`; argument problems found
//! by the CLI itself are [`ArgumentError`]s.

use std::fmt;

use handled::Handle;

/// What the user sees when a command fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserError {
    /// One or more lines describing the failure.
    pub message: String,
    /// How to correct it, when there is something to suggest.
    pub usage_hint: Option<String>,
}

impl UserError {
    /// A failure with no hint.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            usage_hint: None,
        }
    }

    /// Attaches a hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.usage_hint = Some(hint.into());
        self
    }
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Handle<UserError> for UserError {
    fn handle(&self) -> Option<UserError> {
        Some(self.clone())
    }
}

/// A positional argument that could not be parsed.
#[derive(Debug)]
pub struct ArgumentError {
    /// The argument name
    pub field: String,
    /// The value that was given
    pub value: String,
    /// Why it was rejected
    pub reason: String,
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} '{}': {}", self.field, self.value, self.reason)
    }
}

impl std::error::Error for ArgumentError {}

impl Handle<UserError> for ArgumentError {
    fn handle(&self) -> Option<UserError> {
        Some(UserError::new(self.to_string()).with_hint("Run wisectl without arguments for usage"))
    }
}

/// Renders `error` for stderr, prefixed by `context`.
pub fn format_cli_error<E>(error: &E, context: &str) -> String
where
    E: Handle<UserError> + fmt::Display,
{
    match error.handle() {
        Some(UserError {
            message,
            usage_hint: Some(hint),
        }) => format!("Error: {}: {}\nHint: {}", context, message, hint),
        Some(UserError { message, .. }) => format!("Error: {}: {}", context, message),
        None => format!("Error: {}: {}", context, error),
    }
}
