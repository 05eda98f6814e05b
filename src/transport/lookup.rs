//! Single-line requests answered by a stream of lines.
//!
//! Besides job submission the backend answers a handful of one-line queries.  Each reply is read
//! until a line equal to [`COMPLETE`] or the end of the connection.

use std::fmt;

use chrono::NaiveDate;

use crate::codec::escape_text;
use crate::handle::JobHandle;

pub use crate::codec::session::COMPLETE;

/// Which job list to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobListKind {
    /// Jobs that have finished.
    Complete,
    /// Jobs that are running.
    Running,
    /// Jobs waiting for a worker.
    Queued,
}

impl JobListKind {
    fn keyword(self) -> &'static str {
        match self {
            JobListKind::Complete => "LIST_OPTIONS_COMPLETE",
            JobListKind::Running => "LIST_OPTIONS_RUNNING",
            JobListKind::Queued => "LIST_OPTIONS_QUEUED",
        }
    }
}

/// One request the backend answers with a list of lines.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupRequest {
    /// Forecast weather for a location.
    WeatherGet {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
        /// First day of the forecast.
        start_date: NaiveDate,
        /// Number of days.
        days: u32,
        /// Forecast model name.
        model: String,
    },
    /// Cities with forecast data.
    WeatherListCities {
        /// Country code.
        country: String,
        /// Province or state code.
        province: String,
    },
    /// Named timezones the backend knows.
    ListTimezones,
    /// Archive a job's outputs as tar.
    Tar(JobHandle),
    /// Archive a job's outputs as zip.
    Zip(JobHandle),
    /// Remove a job.
    Delete(JobHandle),
    /// Stop a running job.
    StopJob {
        /// The job to stop.
        job: JobHandle,
        /// Priority of the stop request.
        priority: i32,
    },
    /// List jobs by state.
    ListJobs(JobListKind),
}

impl LookupRequest {
    /// The request line, without its terminator.
    pub fn request_line(&self) -> String {
        match self {
            LookupRequest::WeatherGet {
                latitude,
                longitude,
                start_date,
                days,
                model,
            } => format!(
                "WEATHER_GET {}|{}|{}|{}|{}",
                latitude,
                longitude,
                start_date.format("%Y-%m-%d"),
                days,
                escape_text(model)
            ),
            LookupRequest::WeatherListCities { country, province } => format!(
                "WEATHER_LIST_CITIES {}|{}",
                escape_text(country),
                escape_text(province)
            ),
            LookupRequest::ListTimezones => "LIST_TIMEZONES".to_string(),
            LookupRequest::Tar(job) => format!("TAR {}", job),
            LookupRequest::Zip(job) => format!("ZIP {}", job),
            LookupRequest::Delete(job) => format!("DELETE {}", job),
            LookupRequest::StopJob { job, priority } => format!("STOP_JOB {}|{}", job, priority),
            LookupRequest::ListJobs(kind) => kind.keyword().to_string(),
        }
    }
}

impl fmt::Display for LookupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.request_line())
    }
}

/// Collects the lines of a lookup reply up to the [`COMPLETE`] sentinel.
///
/// Trailing carriage returns are stripped and blank lines dropped.
#[derive(Debug, Default)]
pub struct Reply {
    lines: Vec<String>,
    complete: bool,
}

impl Reply {
    /// Adds one received line.  Returns true once the sentinel has been seen.
    pub fn push(&mut self, line: &str) -> bool {
        if self.complete {
            return true;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim() == COMPLETE {
            self.complete = true;
        } else if !line.trim().is_empty() {
            self.lines.push(line.to_string());
        }
        self.complete
    }

    /// Whether the sentinel arrived.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The lines received before the sentinel.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_lines() {
        let job = JobHandle::new("job_42");
        assert_eq!(LookupRequest::ListTimezones.request_line(), "LIST_TIMEZONES");
        assert_eq!(LookupRequest::Tar(job.clone()).request_line(), "TAR job_42");
        assert_eq!(LookupRequest::Zip(job.clone()).request_line(), "ZIP job_42");
        assert_eq!(LookupRequest::Delete(job.clone()).request_line(), "DELETE job_42");
        assert_eq!(
            LookupRequest::StopJob { job, priority: 3 }.request_line(),
            "STOP_JOB job_42|3"
        );
        assert_eq!(
            LookupRequest::ListJobs(JobListKind::Queued).request_line(),
            "LIST_OPTIONS_QUEUED"
        );
    }

    #[test]
    fn weather_requests() {
        let request = LookupRequest::WeatherGet {
            latitude: 51.5,
            longitude: -115.25,
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            days: 3,
            model: "hrdps".to_string(),
        };
        assert_eq!(request.request_line(), "WEATHER_GET 51.5|-115.25|2024-07-01|3|hrdps");
        let cities = LookupRequest::WeatherListCities {
            country: "CA".to_string(),
            province: "AB".to_string(),
        };
        assert_eq!(cities.to_string(), "WEATHER_LIST_CITIES CA|AB");
    }

    #[test]
    fn reply_stops_at_sentinel() {
        let mut reply = Reply::default();
        let mut done = false;
        for line in ["America/Edmonton\r", "", "America/Toronto", "COMPLETE", "ignored"] {
            done = reply.push(line);
            if done {
                break;
            }
        }
        assert!(done);
        assert!(reply.is_complete());
        assert_eq!(reply.into_lines(), vec!["America/Edmonton", "America/Toronto"]);
    }

    #[test]
    fn reply_without_sentinel() {
        let mut reply = Reply::default();
        assert!(!reply.push("a"));
        assert!(!reply.push("b"));
        assert!(!reply.is_complete());
        assert_eq!(reply.into_lines(), vec!["a", "b"]);
    }
}
