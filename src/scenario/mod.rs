//! # Scenarios
//!
//! A scenario is one fire-growth run: a time range, the option blocks that steer the model, and
//! references to the stations, ignitions, layers, assets and targets it uses.
//!
//! A scenario may instead be a copy of another scenario.  A copy only needs the id of its source;
//! its option blocks carry overrides and are checked and sent field by field.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::codec::{Encode, Fields, RecordWriter, keywords};
use crate::duration::WiseDuration;
use crate::ids::{deserialize_sanitized, impl_identified};
use crate::validation::{
    Validate, ValidationContext, ValidationError, nest, require_text, validate_list,
};

pub mod options;
pub mod references;

pub use options::{FbpOptions, FgmOptions, FmcOptions, FwiOptions, OptionMode};
pub use references::{
    AssetOperation, AssetReference, BurningCondition, IgnitionReference, KnownIds, LayerRef,
    StationStreamRef, TargetReference,
};

/// Property name of a copied scenario's source id.
pub const COPY_SOURCE_PROPERTY: &str = "scenFromCopy";

/// One parameterized fire-growth run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(deserialize_with = "deserialize_sanitized")]
    id: String,
    /// Simulation start.
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    /// Simulation end.
    #[serde(default)]
    pub end_time: Option<DateTime<FixedOffset>>,
    /// How often perimeters are reported.
    #[serde(default = "default_display_interval")]
    pub display_interval: WiseDuration,
    /// Free text.
    #[serde(default)]
    pub comments: String,
    /// Whether this scenario copies another.
    #[serde(default)]
    pub is_copy: bool,
    /// The scenario copied from, when [`is_copy`](Scenario::is_copy) is set.
    #[serde(default, rename = "scenFromCopy")]
    pub copy_source: Option<String>,
    /// Fire growth model options.
    #[serde(default)]
    pub fgm_options: FgmOptions,
    /// Fire behaviour prediction options.
    #[serde(default)]
    pub fbp_options: FbpOptions,
    /// Foliar moisture content options.
    #[serde(default)]
    pub fmc_options: FmcOptions,
    /// Fire weather index options.
    #[serde(default)]
    pub fwi_options: FwiOptions,
    /// Per-day burning limits.
    #[serde(default)]
    pub burning_conditions: Vec<BurningCondition>,
    /// Fuel breaks in effect.
    #[serde(default)]
    pub vector_refs: Vec<String>,
    /// Weather streams used.
    #[serde(default)]
    pub stream_refs: Vec<StationStreamRef>,
    /// Layered grids and patches.
    #[serde(default)]
    pub layer_refs: Vec<LayerRef>,
    /// Ignitions used.
    #[serde(default)]
    pub ignition_refs: Vec<IgnitionReference>,
    /// Assets tracked.
    #[serde(default)]
    pub asset_refs: Vec<AssetReference>,
    /// Target wind directions point at.
    #[serde(default)]
    pub wind_target: Option<TargetReference>,
    /// Target vector directions point at.
    #[serde(default)]
    pub vector_target: Option<TargetReference>,
}

fn default_display_interval() -> WiseDuration {
    WiseDuration::from_hours(1)
}

impl_identified!(Scenario);

impl Scenario {
    pub(crate) fn new(id: String) -> Self {
        Self {
            id,
            start_time: None,
            end_time: None,
            display_interval: default_display_interval(),
            comments: String::new(),
            is_copy: false,
            copy_source: None,
            fgm_options: FgmOptions::default(),
            fbp_options: FbpOptions::default(),
            fmc_options: FmcOptions::default(),
            fwi_options: FwiOptions::default(),
            burning_conditions: Vec::new(),
            vector_refs: Vec::new(),
            stream_refs: Vec::new(),
            layer_refs: Vec::new(),
            ignition_refs: Vec::new(),
            asset_refs: Vec::new(),
            wind_target: None,
            vector_target: None,
        }
    }

    /// Turns this scenario into a copy of `source_id`, clearing its option blocks so that only
    /// overrides set afterwards are sent.
    pub fn make_copy_of(&mut self, source_id: &str) {
        self.is_copy = true;
        self.copy_source = Some(source_id.to_string());
        self.fgm_options = FgmOptions::unset();
        self.fbp_options = FbpOptions::unset();
        self.fmc_options = FmcOptions::unset();
        self.fwi_options = FwiOptions::unset();
    }

    /// How the option blocks are checked and sent.
    pub fn option_mode(&self) -> OptionMode {
        if self.is_copy {
            OptionMode::Copy
        } else {
            OptionMode::Normal
        }
    }

    /// Adds a weather stream by station and stream id.  The first stream added is primary.
    pub fn add_stream_ref(&mut self, station_id: &str, stream_id: &str) -> &mut StationStreamRef {
        let primary = self.stream_refs.is_empty();
        self.stream_refs.push(StationStreamRef {
            station_id: station_id.to_string(),
            stream_id: stream_id.to_string(),
            primary,
        });
        let last = self.stream_refs.len() - 1;
        &mut self.stream_refs[last]
    }

    /// Adds an ignition by id.
    pub fn add_ignition_ref(&mut self, ignition_id: &str) -> &mut IgnitionReference {
        self.ignition_refs.push(IgnitionReference::new(ignition_id));
        let last = self.ignition_refs.len() - 1;
        &mut self.ignition_refs[last]
    }

    /// Layers a grid file, patch or weather grid at `index`.
    pub fn add_layer(&mut self, id: &str, index: u32) {
        self.layer_refs.push(LayerRef {
            id: id.to_string(),
            index,
        });
    }

    /// Puts a fuel break into effect.
    pub fn add_fuel_break_ref(&mut self, fuel_break_id: &str) {
        self.vector_refs.push(fuel_break_id.to_string());
    }

    /// Tracks an asset.
    pub fn add_asset_ref(&mut self, asset_id: &str) -> &mut AssetReference {
        self.asset_refs.push(AssetReference::new(asset_id));
        let last = self.asset_refs.len() - 1;
        &mut self.asset_refs[last]
    }

    /// Adds a burning condition.
    pub fn add_burning_condition(&mut self, condition: BurningCondition) {
        self.burning_conditions.push(condition);
    }

    /// Validates the scenario, resolving its references against `known` when given.
    pub fn check_with(
        &self,
        ctx: &ValidationContext,
        known: Option<&KnownIds<'_>>,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mode = self.option_mode();
        if self.is_copy {
            match self.copy_source.as_deref() {
                None | Some("") => errors.push(ValidationError::new(
                    COPY_SOURCE_PROPERTY,
                    "a copied scenario must name its source scenario",
                )),
                Some(source) => {
                    if known.is_some_and(|k| !k.scenarios.contains(source)) {
                        errors.push(
                            ValidationError::new(
                                COPY_SOURCE_PROPERTY,
                                "no scenario with this id exists in the job",
                            )
                            .with_value(source),
                        );
                    } else if source.eq_ignore_ascii_case(&self.id) {
                        errors.push(
                            ValidationError::new(COPY_SOURCE_PROPERTY, "cannot copy itself")
                                .with_value(source),
                        );
                    }
                }
            }
        } else {
            self.check_schedule(&mut errors);
        }

        nest(&mut errors, "fgmOptions", self.fgm_options.check(mode));
        nest(&mut errors, "fbpOptions", self.fbp_options.check(mode));
        nest(&mut errors, "fmcOptions", self.fmc_options.check(mode));
        nest(&mut errors, "fwiOptions", self.fwi_options.check(mode));
        nest(
            &mut errors,
            "burningConditions",
            validate_list(&self.burning_conditions, ctx),
        );

        let mut vector_errors = Vec::new();
        for (index, id) in self.vector_refs.iter().enumerate() {
            let mut errs = Vec::new();
            require_text(&mut errs, "id", id);
            if !id.is_empty() && known.is_some_and(|k| !k.fuel_breaks.contains(id.as_str())) {
                errs.push(
                    ValidationError::new("id", "no fuel break with this id exists in the job")
                        .with_value(id),
                );
            }
            nest(&mut vector_errors, &index.to_string(), errs);
        }
        nest(&mut errors, "vectorRefs", vector_errors);

        nest(
            &mut errors,
            "streamRefs",
            check_references(&self.stream_refs, ctx, known, StationStreamRef::resolve),
        );
        nest(
            &mut errors,
            "layerRefs",
            check_references(&self.layer_refs, ctx, known, LayerRef::resolve),
        );
        nest(
            &mut errors,
            "ignitionRefs",
            check_references(&self.ignition_refs, ctx, known, IgnitionReference::resolve),
        );
        nest(
            &mut errors,
            "assetRefs",
            check_references(&self.asset_refs, ctx, known, AssetReference::resolve),
        );
        for (property, target) in [
            ("windTarget", &self.wind_target),
            ("vectorTarget", &self.vector_target),
        ] {
            if let Some(target) = target {
                let mut errs = target.check_valid(ctx);
                if let Some(known) = known {
                    errs.extend(target.resolve(known));
                }
                nest(&mut errors, property, errs);
            }
        }
        errors
    }

    fn check_schedule(&self, errors: &mut Vec<ValidationError>) {
        crate::weather::check_time_window(errors, self.start_time.as_ref(), self.end_time.as_ref());
        if self.display_interval.is_negative() || self.display_interval.total_seconds() <= 0.0 {
            errors.push(
                ValidationError::new("displayInterval", "must be greater than zero")
                    .with_value(self.display_interval),
            );
        }
        if self.stream_refs.is_empty() {
            errors.push(ValidationError::new(
                "streamRefs",
                "at least one weather stream is required",
            ));
        }
        if self.ignition_refs.is_empty() {
            errors.push(ValidationError::new(
                "ignitionRefs",
                "at least one ignition is required",
            ));
        }
        let primaries = self.stream_refs.iter().filter(|r| r.primary).count();
        if primaries > 1 {
            errors.push(
                ValidationError::new("streamRefs", "at most one stream may be primary")
                    .with_value(primaries),
            );
        }
    }
}

fn check_references<T: Validate>(
    items: &[T],
    ctx: &ValidationContext,
    known: Option<&KnownIds<'_>>,
    resolve: fn(&T, &KnownIds<'_>) -> Vec<ValidationError>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let mut errs = item.check_valid(ctx);
        if let Some(known) = known {
            errs.extend(resolve(item, known));
        }
        if !errs.is_empty() {
            errors.push(ValidationError::parent(
                index.to_string(),
                format!("entry {} is invalid", index),
                errs,
            ));
        }
    }
    errors
}

impl Validate for Scenario {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        self.check_with(ctx, None)
    }
}

impl Encode for Scenario {
    fn encode(&self, out: &mut RecordWriter) {
        let mode = self.option_mode();
        out.record(keywords::SCENARIO_START, Fields::new().raw(&self.id));
        out.record(
            keywords::SCENARIO,
            Fields::new()
                .opt_time(self.start_time.as_ref())
                .opt_time(self.end_time.as_ref())
                .duration(&self.display_interval)
                .text(&self.comments),
        );
        if let (true, Some(source)) = (self.is_copy, &self.copy_source) {
            out.record(keywords::SCENARIO_COPY, Fields::new().raw(source));
        }
        self.fgm_options.encode(mode, out);
        self.fbp_options.encode(mode, out);
        self.fmc_options.encode(mode, out);
        self.fwi_options.encode(mode, out);
        self.burning_conditions.encode(out);
        for id in &self.vector_refs {
            out.record(keywords::VECTOR_REF, Fields::new().raw(id));
        }
        self.stream_refs.encode(out);
        self.layer_refs.encode(out);
        self.ignition_refs.encode(out);
        self.asset_refs.encode(out);
        if let Some(target) = &self.wind_target {
            target.encode_as(keywords::WIND_TARGET, out);
        }
        if let Some(target) = &self.vector_target {
            target.encode_as(keywords::VECTOR_TARGET, out);
        }
        out.record(keywords::SCENARIO_END, Fields::new().raw(&self.id));
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ctx() -> ValidationContext {
        ValidationContext::without_file_checks()
    }

    fn time(day: u32) -> DateTime<FixedOffset> {
        FixedOffset::west_opt(6 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 7, day, 13, 0, 0)
            .unwrap()
    }

    fn runnable() -> Scenario {
        let mut scenario = Scenario::new("scen0".to_string());
        scenario.start_time = Some(time(1));
        scenario.end_time = Some(time(2));
        scenario.add_stream_ref("wthrstn0", "wthrstrm0");
        scenario.add_ignition_ref("ign0");
        scenario
    }

    fn names(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.property_name.as_str()).collect()
    }

    #[test]
    fn runnable_scenario_is_valid() {
        assert!(runnable().is_valid(&ctx()));
    }

    #[test]
    fn empty_scenario_reports_schedule_and_references() {
        let scenario = Scenario::new("scen0".to_string());
        let errors = scenario.check_valid(&ctx());
        assert_eq!(
            names(&errors),
            vec!["startTime", "endTime", "streamRefs", "ignitionRefs"]
        );
    }

    #[test]
    fn copy_without_source_has_one_error() {
        let mut scenario = Scenario::new("scen1".to_string());
        scenario.is_copy = true;
        scenario.fgm_options = FgmOptions::unset();
        let errors = scenario.check_valid(&ctx());
        assert_eq!(names(&errors), vec![COPY_SOURCE_PROPERTY]);

        scenario.start_time = Some(time(1));
        scenario.end_time = Some(time(2));
        let errors = scenario.check_valid(&ctx());
        assert_eq!(names(&errors), vec![COPY_SOURCE_PROPERTY]);
    }

    #[test]
    fn copy_sends_settings_instead_of_options() {
        let mut scenario = Scenario::new("scen1".to_string());
        scenario.make_copy_of("scen0");
        scenario.fgm_options.dist_res = Some(2.0);
        assert!(scenario.is_valid(&ctx()));
        let mut out = RecordWriter::new();
        scenario.encode(&mut out);
        let message = out.finish();
        assert_eq!(
            message.keywords(),
            vec![
                "scenariostart",
                "scenario",
                "scenariocopy",
                "fgm_settings",
                "scenarioend"
            ]
        );
        assert_eq!(message.data_for("scenariocopy"), vec!["scen0"]);
    }

    #[test]
    fn only_one_primary_stream() {
        let mut scenario = runnable();
        scenario.add_stream_ref("wthrstn0", "wthrstrm1").primary = true;
        let errors = scenario.check_valid(&ctx());
        assert_eq!(names(&errors), vec!["streamRefs"]);
        assert!(errors[0].is_leaf());
    }

    #[test]
    fn unknown_references_are_nested() {
        let scenario = runnable();
        let mut known = KnownIds::default();
        known.streams.insert(("wthrstn0", "wthrstrm0"));
        let errors = scenario.check_with(&ctx(), Some(&known));
        assert_eq!(names(&errors), vec!["ignitionRefs"]);
        let entry = &errors[0].children[0];
        assert_eq!(entry.property_name, "0");
        assert_eq!(entry.children[0].property_name, "id");
        assert_eq!(entry.children[0].value.as_deref(), Some("ign0"));
    }

    #[test]
    fn wire_order() {
        let mut scenario = runnable();
        scenario.add_fuel_break_ref("fuelbrk0");
        scenario.add_layer("grdfl0", 1);
        scenario.wind_target = Some(TargetReference::new("target0"));
        let mut out = RecordWriter::new();
        scenario.encode(&mut out);
        let message = out.finish();
        assert_eq!(
            message.keywords(),
            vec![
                "scenariostart",
                "scenario",
                "fgmoptions",
                "fbpoptions",
                "fmcoptions",
                "fwioptions",
                "vectorref",
                "streamref",
                "layerinfo",
                "ignitionref",
                "windtarget",
                "scenarioend"
            ]
        );
        assert_eq!(
            message.data_for("scenario")[0],
            "2024-07-01T13:00:00-06:00|2024-07-02T13:00:00-06:00|PT1H|"
        );
        assert_eq!(message.data_for("streamref")[0], "wthrstn0|wthrstrm0|1");
    }
}
