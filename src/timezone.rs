//! The timezone the backend uses to interpret and report local times.

use serde::{Deserialize, Serialize};

use crate::codec::{Encode, Fields, RecordWriter, keywords};
use crate::duration::WiseDuration;
use crate::validation::{Range, Validate, ValidationContext, ValidationError};

const OFFSET_SECONDS: Range = Range::closed(-12.0 * 3_600.0, 14.0 * 3_600.0);

/// Either a value from the backend's timezone list or an explicit UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timezone {
    /// An entry of the backend's timezone list, as returned by `LIST_TIMEZONES`.
    Named {
        /// The list value.
        value: i32,
    },
    /// A fixed offset from UTC.
    Offset {
        /// Offset from UTC; negative west of Greenwich.
        offset: WiseDuration,
        /// Whether daylight saving time is in effect.
        #[serde(default)]
        dst: bool,
    },
}

impl Default for Timezone {
    fn default() -> Self {
        Timezone::Offset {
            offset: WiseDuration::zero(),
            dst: false,
        }
    }
}

impl Timezone {
    /// A fixed offset of `hours` from UTC.
    pub fn from_offset_hours(hours: i32, dst: bool) -> Self {
        let offset = WiseDuration::from_hours(hours.unsigned_abs());
        Timezone::Offset {
            offset: if hours < 0 { offset.negated() } else { offset },
            dst,
        }
    }
}

impl Validate for Timezone {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match self {
            Timezone::Named { value } => {
                if *value < 0 {
                    errors.push(
                        ValidationError::new("value", "must not be negative").with_value(value),
                    );
                }
            }
            Timezone::Offset { offset, .. } => {
                if !OFFSET_SECONDS.contains(offset.total_seconds()) {
                    errors.push(
                        ValidationError::new("offset", "must be between -12 and +14 hours")
                            .with_value(offset),
                    );
                }
            }
        }
        errors
    }
}

impl Encode for Timezone {
    fn encode(&self, out: &mut RecordWriter) {
        let fields = match self {
            Timezone::Named { value } => Fields::new().int((*value).into()).null().null(),
            Timezone::Offset { offset, dst } => Fields::new().null().duration(offset).flag(*dst),
        };
        out.record(keywords::TIMEZONE, fields);
    }
}
