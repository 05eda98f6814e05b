//! Assets the fire should be tracked against, and targets wind and vectors can point at.

use serde::{Deserialize, Serialize};

use crate::codec::{Encode, Fields, RecordWriter, keywords};
use crate::geometry::Shape;
use crate::ids::{deserialize_sanitized, impl_identified};
use crate::validation::{Range, Validate, ValidationContext, ValidationError, check_optional_range, nest};

/// Something of value on the landscape, such as a community or a piece of infrastructure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFile {
    #[serde(deserialize_with = "deserialize_sanitized")]
    id: String,
    /// The asset's geometry.
    pub shape: Shape,
    /// Buffer around the asset in metres.
    #[serde(default)]
    pub buffer: Option<f64>,
    /// Free text.
    #[serde(default)]
    pub comments: String,
}

impl_identified!(AssetFile);

impl AssetFile {
    pub(crate) fn new(id: String, shape: Shape) -> Self {
        Self {
            id,
            shape,
            buffer: None,
            comments: String::new(),
        }
    }
}

impl Validate for AssetFile {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        nest(&mut errors, "shape", self.shape.check_valid(ctx));
        check_optional_range(&mut errors, "buffer", self.buffer, Range::at_least(0.0));
        errors
    }
}

impl Encode for AssetFile {
    fn encode(&self, out: &mut RecordWriter) {
        let fields = self.shape.wire_fields(Fields::new().raw(&self.id));
        out.record(
            keywords::ASSET_FILE,
            fields.opt_num(self.buffer).text(&self.comments),
        );
    }
}

/// A location wind or vector directions can be aimed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetFile {
    #[serde(deserialize_with = "deserialize_sanitized")]
    id: String,
    /// The target's geometry.
    pub shape: Shape,
    /// Free text.
    #[serde(default)]
    pub comments: String,
}

impl_identified!(TargetFile);

impl TargetFile {
    pub(crate) fn new(id: String, shape: Shape) -> Self {
        Self {
            id,
            shape,
            comments: String::new(),
        }
    }
}

impl Validate for TargetFile {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        nest(&mut errors, "shape", self.shape.check_valid(ctx));
        errors
    }
}

impl Encode for TargetFile {
    fn encode(&self, out: &mut RecordWriter) {
        let fields = self.shape.wire_fields(Fields::new().raw(&self.id));
        out.record(keywords::TARGET_FILE, fields.text(&self.comments));
    }
}
