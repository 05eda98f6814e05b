//! Ignitions: where and when fires start.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::codec::{Encode, Fields, RecordWriter, keywords};
use crate::geometry::Shape;
use crate::ids::{deserialize_sanitized, impl_identified};
use crate::validation::{Validate, ValidationContext, ValidationError, nest, require};

/// A fire start, drawn as a point, line, polygon or file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ignition {
    #[serde(deserialize_with = "deserialize_sanitized")]
    id: String,
    /// When the fire starts.
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    /// Where the fire starts.
    pub shape: Shape,
    /// Extra key/value attributes passed through to the backend.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Free text.
    #[serde(default)]
    pub comments: String,
}

impl_identified!(Ignition);

impl Ignition {
    pub(crate) fn new(id: String, start_time: Option<DateTime<FixedOffset>>, shape: Shape) -> Self {
        Self {
            id,
            start_time,
            shape,
            attributes: BTreeMap::new(),
            comments: String::new(),
        }
    }

    /// Sets an attribute, replacing any earlier value for `key`.
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        self.attributes.insert(key.to_string(), value.to_string());
    }
}

impl Validate for Ignition {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require(&mut errors, "startTime", &self.start_time);
        nest(&mut errors, "shape", self.shape.check_valid(ctx));
        if self.attributes.keys().any(|k| k.trim().is_empty()) {
            errors.push(ValidationError::new("attributes", "attribute names must not be empty"));
        }
        errors
    }
}

impl Encode for Ignition {
    fn encode(&self, out: &mut RecordWriter) {
        let fields = Fields::new()
            .raw(&self.id)
            .opt_time(self.start_time.as_ref());
        let mut fields = self
            .shape
            .wire_fields(fields)
            .text(&self.comments)
            .int(self.attributes.len() as i64);
        for (key, value) in &self.attributes {
            fields = fields.text(key).text(value);
        }
        out.record(keywords::IGNITION, fields);
    }
}
