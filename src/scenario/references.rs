//! References from a scenario to entities owned by the job, plus burning conditions.
//!
//! References hold ids by value.  [`KnownIds`] is the job's index used to resolve them.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::codec::{Encode, Fields, RecordWriter, keywords};
use crate::duration::WiseDuration;
use crate::validation::{
    Range, Validate, ValidationContext, ValidationError, check_optional_range, require_text,
};
use crate::weather::check_time_of_day;

/// Ids present in a job, by kind.
#[derive(Debug, Default)]
pub struct KnownIds<'a> {
    pub(crate) streams: HashSet<(&'a str, &'a str)>,
    pub(crate) fuel_breaks: HashSet<&'a str>,
    pub(crate) layers: HashSet<&'a str>,
    pub(crate) ignitions: HashSet<&'a str>,
    pub(crate) assets: HashSet<&'a str>,
    pub(crate) targets: HashSet<&'a str>,
    pub(crate) scenarios: HashSet<&'a str>,
}

fn unknown(property: &str, kind: &str, id: &str) -> ValidationError {
    ValidationError::new(property, format!("no {} with this id exists in the job", kind))
        .with_value(id)
}

////////////////////////////////////////////// Weather streams //////////////////////////////////////////

/// A weather stream used by a scenario, named by its station and its own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationStreamRef {
    /// The owning station.
    pub station_id: String,
    /// The stream.
    pub stream_id: String,
    /// Whether this is the scenario's primary stream.
    #[serde(default)]
    pub primary: bool,
}

impl StationStreamRef {
    pub(crate) fn resolve(&self, known: &KnownIds<'_>) -> Vec<ValidationError> {
        let key = (self.station_id.as_str(), self.stream_id.as_str());
        if self.station_id.is_empty() || self.stream_id.is_empty() || known.streams.contains(&key) {
            Vec::new()
        } else {
            vec![unknown("streamId", "weather stream on this station", &self.stream_id)]
        }
    }
}

impl Validate for StationStreamRef {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "stationId", &self.station_id);
        require_text(&mut errors, "streamId", &self.stream_id);
        errors
    }
}

impl Encode for StationStreamRef {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::STREAM_REF,
            Fields::new()
                .raw(&self.station_id)
                .raw(&self.stream_id)
                .flag(self.primary),
        );
    }
}

/////////////////////////////////////////////////// Layers ///////////////////////////////////////////////

/// A grid file, fuel patch, weather patch or weather grid layered into a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRef {
    /// The layered entity.
    pub id: String,
    /// Stacking order; higher layers apply last.
    pub index: u32,
}

impl LayerRef {
    pub(crate) fn resolve(&self, known: &KnownIds<'_>) -> Vec<ValidationError> {
        if self.id.is_empty() || known.layers.contains(self.id.as_str()) {
            Vec::new()
        } else {
            vec![unknown("id", "grid file, patch or weather grid", &self.id)]
        }
    }
}

impl Validate for LayerRef {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "id", &self.id);
        errors
    }
}

impl Encode for LayerRef {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::LAYER_INFO,
            Fields::new().raw(&self.id).int(self.index.into()),
        );
    }
}

///////////////////////////////////////////////// Ignitions //////////////////////////////////////////////

/// An ignition used by a scenario, optionally narrowed to one polygon or vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnitionReference {
    /// The ignition.
    pub id: String,
    /// Polygon index within a multi-polygon file.
    #[serde(default)]
    pub poly_index: Option<i32>,
    /// Vertex index within that polygon.
    #[serde(default)]
    pub poly_vertex: Option<i32>,
}

impl IgnitionReference {
    /// A reference to the whole ignition.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            poly_index: None,
            poly_vertex: None,
        }
    }

    pub(crate) fn resolve(&self, known: &KnownIds<'_>) -> Vec<ValidationError> {
        if self.id.is_empty() || known.ignitions.contains(self.id.as_str()) {
            Vec::new()
        } else {
            vec![unknown("id", "ignition", &self.id)]
        }
    }
}

impl Validate for IgnitionReference {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "id", &self.id);
        if self.poly_vertex.is_some() && self.poly_index.is_none() {
            errors.push(ValidationError::new(
                "polyIndex",
                "is required when a vertex is given",
            ));
        }
        errors
    }
}

impl Encode for IgnitionReference {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::IGNITION_REF,
            Fields::new()
                .raw(&self.id)
                .opt_int(self.poly_index.map(i64::from))
                .opt_int(self.poly_vertex.map(i64::from)),
        );
    }
}

/////////////////////////////////////////////////// Assets ///////////////////////////////////////////////

/// What the simulation does when the fire reaches an asset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetOperation {
    /// Keep simulating.
    #[default]
    NoEffect,
    /// Stop as soon as any asset is reached.
    StopImmediate,
    /// Stop once every asset has been reached.
    StopAfterAll,
    /// Stop after a given number of collisions.
    StopAfterX,
}

impl AssetOperation {
    fn wire_value(self) -> i64 {
        match self {
            AssetOperation::NoEffect => -1,
            AssetOperation::StopImmediate => 0,
            AssetOperation::StopAfterAll => 1,
            AssetOperation::StopAfterX => 2,
        }
    }
}

/// An asset tracked by a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetReference {
    /// The asset.
    pub id: String,
    /// What happens on arrival.
    #[serde(default)]
    pub operation: AssetOperation,
    /// Collisions before stopping, for [`AssetOperation::StopAfterX`].
    #[serde(default)]
    pub collision_count: Option<i32>,
}

impl AssetReference {
    /// A reference that only tracks arrival.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            operation: AssetOperation::NoEffect,
            collision_count: None,
        }
    }

    pub(crate) fn resolve(&self, known: &KnownIds<'_>) -> Vec<ValidationError> {
        if self.id.is_empty() || known.assets.contains(self.id.as_str()) {
            Vec::new()
        } else {
            vec![unknown("id", "asset", &self.id)]
        }
    }
}

impl Validate for AssetReference {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "id", &self.id);
        if self.operation == AssetOperation::StopAfterX {
            match self.collision_count {
                Some(count) if count >= 1 => {}
                Some(count) => errors.push(
                    ValidationError::new("collisionCount", "must be at least 1").with_value(count),
                ),
                None => errors.push(ValidationError::new("collisionCount", "is required")),
            }
        }
        errors
    }
}

impl Encode for AssetReference {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::ASSET_REF,
            Fields::new()
                .raw(&self.id)
                .int(self.operation.wire_value())
                .int(self.collision_count.map(i64::from).unwrap_or(-1)),
        );
    }
}

/////////////////////////////////////////////////// Targets //////////////////////////////////////////////

/// A target geometry, optionally narrowed to one feature and one of its points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReference {
    /// The target.
    pub id: String,
    /// Feature index.
    #[serde(default)]
    pub index: u32,
    /// Point index within the feature.
    #[serde(default)]
    pub sub_index: u32,
}

impl TargetReference {
    /// The first point of the first feature of `id`.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            index: 0,
            sub_index: 0,
        }
    }

    pub(crate) fn resolve(&self, known: &KnownIds<'_>) -> Vec<ValidationError> {
        if self.id.is_empty() || known.targets.contains(self.id.as_str()) {
            Vec::new()
        } else {
            vec![unknown("id", "target", &self.id)]
        }
    }

    pub(crate) fn encode_as(&self, keyword: &'static str, out: &mut RecordWriter) {
        out.record(
            keyword,
            Fields::new()
                .raw(&self.id)
                .int(self.index.into())
                .int(self.sub_index.into()),
        );
    }
}

impl Validate for TargetReference {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "id", &self.id);
        errors
    }
}

///////////////////////////////////////////// Burning conditions /////////////////////////////////////////

/// Limits on when fire can spread on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurningCondition {
    /// The day the condition applies to.
    pub date: NaiveDate,
    /// Earliest time of day burning is allowed.
    #[serde(default)]
    pub start_time_of_day: WiseDuration,
    /// Latest time of day burning is allowed.
    #[serde(default)]
    pub end_time_of_day: WiseDuration,
    /// Burning requires FWI above this value.
    #[serde(default)]
    pub fwi_greater: Option<f64>,
    /// Burning requires wind speed above this value.
    #[serde(default)]
    pub ws_greater: Option<f64>,
    /// Burning requires relative humidity below this value.
    #[serde(default)]
    pub rh_less: Option<f64>,
    /// Burning requires ISI above this value.
    #[serde(default)]
    pub isi_greater: Option<f64>,
}

impl BurningCondition {
    /// A condition allowing burning all day on `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            start_time_of_day: WiseDuration::zero(),
            end_time_of_day: WiseDuration::from_hours(23).with_minutes(59).with_seconds(59.0),
            fwi_greater: None,
            ws_greater: None,
            rh_less: None,
            isi_greater: None,
        }
    }
}

impl Validate for BurningCondition {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_time_of_day(&mut errors, "startTimeOfDay", &self.start_time_of_day);
        check_time_of_day(&mut errors, "endTimeOfDay", &self.end_time_of_day);
        if self.start_time_of_day.total_seconds() > self.end_time_of_day.total_seconds() {
            errors.push(
                ValidationError::new("endTimeOfDay", "must not be before the start time of day")
                    .with_value(self.end_time_of_day),
            );
        }
        check_optional_range(&mut errors, "fwiGreater", self.fwi_greater, Range::at_least(0.0));
        check_optional_range(&mut errors, "wsGreater", self.ws_greater, Range::closed(0.0, 200.0));
        check_optional_range(&mut errors, "rhLess", self.rh_less, Range::closed(0.0, 100.0));
        check_optional_range(&mut errors, "isiGreater", self.isi_greater, Range::at_least(0.0));
        errors
    }
}

impl Encode for BurningCondition {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::BURNING_CONDITION,
            Fields::new()
                .date(&self.date)
                .duration(&self.start_time_of_day)
                .duration(&self.end_time_of_day)
                .opt_num(self.fwi_greater)
                .opt_num(self.ws_greater)
                .opt_num(self.rh_less)
                .opt_num(self.isi_greater),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ValidationContext {
        ValidationContext::without_file_checks()
    }

    #[test]
    fn stream_reference_resolution() {
        let mut known = KnownIds::default();
        known.streams.insert(("wthrstn0", "wthrstrm0"));
        let good = StationStreamRef {
            station_id: "wthrstn0".to_string(),
            stream_id: "wthrstrm0".to_string(),
            primary: true,
        };
        assert!(good.resolve(&known).is_empty());
        let wrong_station = StationStreamRef {
            station_id: "wthrstn1".to_string(),
            ..good.clone()
        };
        let errors = wrong_station.resolve(&known);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property_name, "streamId");
    }

    #[test]
    fn stop_after_x_needs_a_count() {
        let mut reference = AssetReference::new("asset0");
        reference.operation = AssetOperation::StopAfterX;
        assert_eq!(reference.check_valid(&ctx())[0].property_name, "collisionCount");
        reference.collision_count = Some(0);
        assert!(!reference.is_valid(&ctx()));
        reference.collision_count = Some(2);
        assert!(reference.is_valid(&ctx()));
    }

    #[test]
    fn burning_condition_thresholds() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let mut condition = BurningCondition::new(date);
        assert!(condition.is_valid(&ctx()));
        condition.ws_greater = Some(201.0);
        condition.rh_less = Some(100.0);
        condition.start_time_of_day = WiseDuration::from_hours(20);
        condition.end_time_of_day = WiseDuration::from_hours(8);
        let names: Vec<_> = condition
            .check_valid(&ctx())
            .into_iter()
            .map(|e| e.property_name)
            .collect();
        assert_eq!(names, vec!["endTimeOfDay", "wsGreater"]);
    }

    #[test]
    fn reference_wire_layouts() {
        let mut out = RecordWriter::new();
        IgnitionReference::new("ign0").encode(&mut out);
        AssetReference::new("asset0").encode(&mut out);
        TargetReference::new("target0").encode_as(keywords::WIND_TARGET, &mut out);
        LayerRef {
            id: "grdfl0".to_string(),
            index: 2,
        }
        .encode(&mut out);
        let message = out.finish();
        assert_eq!(message.data_for("ignitionref"), vec!["ign0|null|null"]);
        assert_eq!(message.data_for("assetref"), vec!["asset0|-1|-1"]);
        assert_eq!(message.data_for("windtarget"), vec!["target0|0|0"]);
        assert_eq!(message.data_for("layerinfo"), vec!["grdfl0|2"]);
    }
}
