//! # Job Handles
//!
//! The backend answers a submission with the name it gave the job.  That name is the only thing
//! later status, stop, or download requests need.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The backend's name for a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    /// Wraps a backend response, trimmed of surrounding whitespace.
    pub fn new(name: &str) -> Self {
        Self(crate::codec::trim_response(name).to_string())
    }

    /// The job name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the backend returned nothing usable.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobHandle {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl AsRef<str> for JobHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
