//! # Scenario option blocks
//!
//! Every option is optional so that a scenario copied from another can override only the fields
//! it sets.  A normal scenario sends each block as one record with `null` for unset fields; a
//! copy sends one `name|value` settings record per set field.

use serde::{Deserialize, Serialize};

use crate::codec::{Fields, RecordWriter, keywords};
use crate::duration::WiseDuration;
use crate::validation::{Range, ValidationContext, ValidationError, Validate, check_optional_range, require};

const MAX_ACCEL_TS: Range = Range::closed(1.0, 300.0);
const RESOLUTION: Range = Range::closed(0.2, 10.0);
const MINIMUM_ROS: Range = Range::closed(0.0000001, 1.0);
const NUDGE_DISTANCE: Range = Range::closed(-250.0, 250.0);
const NUDGE_TIME: Range = Range::closed(-14_400.0, 14_400.0);
const DELTA_DIRECTION: Range = Range::closed(-360.0, 360.0);
const OVERRIDE_DIRECTION: Range = Range::half_open(0.0, 360.0);
const DELTA_VELOCITY: Range = Range::closed(-250.0, 250.0);
const OVERRIDE_VELOCITY: Range = Range::closed(0.0, 250.0);
const GROWTH_PERCENTILE: Range = Range::open(0.0, 100.0);
const INITIAL_VERTEX_COUNT: Range = Range::closed(6.0, 64.0);
const IGNITION_SIZE: Range = Range::open_closed(0.0, 25.0);
const PERIMETER_SPACING: Range = Range::closed(0.0, 10.0);
const PERCENT_OVERRIDE: Range = Range::closed(0.0, 300.0);
const NODATA_ELEVATION: Range = Range::closed(-99.0, 7000.0);

/// Whether an option block belongs to a normal scenario or to a copy of another scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMode {
    /// Every required option must be set.
    Normal,
    /// Only set options are checked and sent.
    Copy,
}

/// A named option with its wire value, if set.
type Setting = (&'static str, Option<String>);

fn flag(value: Option<bool>) -> Option<String> {
    value.map(|v| if v { "1" } else { "0" }.to_string())
}

fn num(value: Option<f64>) -> Option<String> {
    value.map(|v| v.to_string())
}

fn int(value: Option<i32>) -> Option<String> {
    value.map(|v| v.to_string())
}

fn duration(value: Option<&WiseDuration>) -> Option<String> {
    value.map(WiseDuration::to_string)
}

fn encode_settings(
    out: &mut RecordWriter,
    mode: OptionMode,
    options_keyword: &'static str,
    settings_keyword: &'static str,
    settings: Vec<Setting>,
) {
    match mode {
        OptionMode::Normal => {
            let fields = settings
                .into_iter()
                .fold(Fields::new(), |fields, (_, value)| match value {
                    Some(value) => fields.raw(value),
                    None => fields.null(),
                });
            out.record(options_keyword, fields);
        }
        OptionMode::Copy => {
            for (name, value) in settings {
                if let Some(value) = value {
                    out.record(settings_keyword, Fields::new().raw(name).raw(value));
                }
            }
        }
    }
}

fn require_all(errors: &mut Vec<ValidationError>, mode: OptionMode, flags: &[(&str, Option<bool>)]) {
    if mode == OptionMode::Normal {
        for (name, value) in flags {
            require(errors, name, value);
        }
    }
}

/////////////////////////////////////////////////// FGM //////////////////////////////////////////////////

/// Fire growth model options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FgmOptions {
    /// Maximum time step during acceleration.
    #[serde(rename = "maxAccelTS")]
    pub max_accel_ts: Option<WiseDuration>,
    /// Distance resolution.
    pub dist_res: Option<f64>,
    /// Perimeter resolution.
    pub perim_res: Option<f64>,
    /// Minimum rate of spread for a vertex to keep moving.
    #[serde(rename = "minimumSpreadingROS")]
    pub minimum_spreading_ros: Option<f64>,
    /// Stop the simulation when the fire reaches the grid edge.
    pub stop_at_grid_end: Option<bool>,
    /// Allow breaching of fuel breaks.
    pub breaching: Option<bool>,
    /// Scale spatial thresholds with fire size.
    pub dynamic_spatial_threshold: Option<bool>,
    /// Simulate spotting.
    pub spotting: Option<bool>,
    /// Remove perimeters that cannot be displayed.
    pub purge_non_displayable: Option<bool>,
    /// Ignition nudge east, in metres.
    pub dx: Option<f64>,
    /// Ignition nudge north, in metres.
    pub dy: Option<f64>,
    /// Ignition time nudge.
    pub dt: Option<WiseDuration>,
    /// Wind direction delta.
    pub dwd: Option<f64>,
    /// Wind direction override.
    pub owd: Option<f64>,
    /// Vector direction delta.
    pub dvd: Option<f64>,
    /// Vector direction override.
    pub ovd: Option<f64>,
    /// Apply the growth percentile.
    pub growth_percentile_applied: Option<bool>,
    /// Growth percentile used when applied.
    pub growth_percentile: Option<f64>,
    /// Suppress tight concave angles during growth.
    pub suppress_tight_concave: Option<bool>,
    /// Treat non-fuel cells as vector breaks.
    pub non_fuels_as_vector_breaks: Option<bool>,
    /// Convert non-fuel cells to vector breaks.
    pub non_fuels_to_vector_breaks: Option<bool>,
    /// Advance each fire with its own time step.
    pub use_independent_timesteps: Option<bool>,
    /// Perimeter spacing in metres.
    pub perimeter_spacing: Option<f64>,
    /// Vertices in a point ignition's starting polygon.
    pub initial_vertex_count: Option<i32>,
    /// Size of a point ignition's starting polygon, in metres.
    pub ignition_size: Option<f64>,
}

impl Default for FgmOptions {
    fn default() -> Self {
        Self {
            max_accel_ts: Some(WiseDuration::from_minutes(2)),
            dist_res: Some(1.0),
            perim_res: Some(1.0),
            minimum_spreading_ros: Some(0.001),
            stop_at_grid_end: Some(true),
            breaching: Some(true),
            dynamic_spatial_threshold: Some(true),
            spotting: Some(true),
            purge_non_displayable: Some(false),
            growth_percentile_applied: Some(false),
            ..Self::unset()
        }
    }
}

impl FgmOptions {
    /// Options with nothing set, as a copied scenario starts.
    pub fn unset() -> Self {
        Self {
            max_accel_ts: None,
            dist_res: None,
            perim_res: None,
            minimum_spreading_ros: None,
            stop_at_grid_end: None,
            breaching: None,
            dynamic_spatial_threshold: None,
            spotting: None,
            purge_non_displayable: None,
            dx: None,
            dy: None,
            dt: None,
            dwd: None,
            owd: None,
            dvd: None,
            ovd: None,
            growth_percentile_applied: None,
            growth_percentile: None,
            suppress_tight_concave: None,
            non_fuels_as_vector_breaks: None,
            non_fuels_to_vector_breaks: None,
            use_independent_timesteps: None,
            perimeter_spacing: None,
            initial_vertex_count: None,
            ignition_size: None,
        }
    }

    /// Every problem with the block in `mode`.
    pub fn check(&self, mode: OptionMode) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if mode == OptionMode::Normal {
            require(&mut errors, "maxAccelTS", &self.max_accel_ts);
            require(&mut errors, "distRes", &self.dist_res);
            require(&mut errors, "perimRes", &self.perim_res);
            require(&mut errors, "minimumSpreadingROS", &self.minimum_spreading_ros);
        }
        require_all(
            &mut errors,
            mode,
            &[
                ("stopAtGridEnd", self.stop_at_grid_end),
                ("breaching", self.breaching),
                ("dynamicSpatialThreshold", self.dynamic_spatial_threshold),
                ("spotting", self.spotting),
                ("purgeNonDisplayable", self.purge_non_displayable),
                ("growthPercentileApplied", self.growth_percentile_applied),
            ],
        );
        check_optional_range(
            &mut errors,
            "maxAccelTS",
            self.max_accel_ts.map(|d| d.total_seconds()),
            MAX_ACCEL_TS,
        );
        check_optional_range(&mut errors, "distRes", self.dist_res, RESOLUTION);
        check_optional_range(&mut errors, "perimRes", self.perim_res, RESOLUTION);
        check_optional_range(
            &mut errors,
            "minimumSpreadingROS",
            self.minimum_spreading_ros,
            MINIMUM_ROS,
        );
        check_optional_range(&mut errors, "dx", self.dx, NUDGE_DISTANCE);
        check_optional_range(&mut errors, "dy", self.dy, NUDGE_DISTANCE);
        check_optional_range(&mut errors, "dt", self.dt.map(|d| d.total_seconds()), NUDGE_TIME);
        check_optional_range(&mut errors, "dwd", self.dwd, DELTA_DIRECTION);
        check_optional_range(&mut errors, "owd", self.owd, OVERRIDE_DIRECTION);
        check_optional_range(&mut errors, "dvd", self.dvd, DELTA_VELOCITY);
        check_optional_range(&mut errors, "ovd", self.ovd, OVERRIDE_VELOCITY);
        if self.growth_percentile_applied == Some(true) {
            require(&mut errors, "growthPercentile", &self.growth_percentile);
        }
        check_optional_range(
            &mut errors,
            "growthPercentile",
            self.growth_percentile,
            GROWTH_PERCENTILE,
        );
        check_optional_range(
            &mut errors,
            "perimeterSpacing",
            self.perimeter_spacing,
            PERIMETER_SPACING,
        );
        check_optional_range(
            &mut errors,
            "initialVertexCount",
            self.initial_vertex_count.map(f64::from),
            INITIAL_VERTEX_COUNT,
        );
        check_optional_range(&mut errors, "ignitionSize", self.ignition_size, IGNITION_SIZE);
        errors
    }

    fn settings(&self) -> Vec<Setting> {
        vec![
            ("maxAccelTS", duration(self.max_accel_ts.as_ref())),
            ("distRes", num(self.dist_res)),
            ("perimRes", num(self.perim_res)),
            ("minimumSpreadingROS", num(self.minimum_spreading_ros)),
            ("stopAtGridEnd", flag(self.stop_at_grid_end)),
            ("breaching", flag(self.breaching)),
            ("dynamicSpatialThreshold", flag(self.dynamic_spatial_threshold)),
            ("spotting", flag(self.spotting)),
            ("purgeNonDisplayable", flag(self.purge_non_displayable)),
            ("dx", num(self.dx)),
            ("dy", num(self.dy)),
            ("dt", duration(self.dt.as_ref())),
            ("dwd", num(self.dwd)),
            ("owd", num(self.owd)),
            ("dvd", num(self.dvd)),
            ("ovd", num(self.ovd)),
            ("growthPercentileApplied", flag(self.growth_percentile_applied)),
            ("growthPercentile", num(self.growth_percentile)),
            ("suppressTightConcave", flag(self.suppress_tight_concave)),
            ("nonFuelsAsVectorBreaks", flag(self.non_fuels_as_vector_breaks)),
            ("nonFuelsToVectorBreaks", flag(self.non_fuels_to_vector_breaks)),
            ("useIndependentTimesteps", flag(self.use_independent_timesteps)),
            ("perimeterSpacing", num(self.perimeter_spacing)),
            ("initialVertexCount", int(self.initial_vertex_count)),
            ("ignitionSize", num(self.ignition_size)),
        ]
    }

    /// Appends the block's records for `mode`.
    pub fn encode(&self, mode: OptionMode, out: &mut RecordWriter) {
        encode_settings(
            out,
            mode,
            keywords::FGM_OPTIONS,
            keywords::FGM_SETTINGS,
            self.settings(),
        );
    }
}

impl Validate for FgmOptions {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        self.check(OptionMode::Normal)
    }
}

/////////////////////////////////////////////////// FBP //////////////////////////////////////////////////

/// Fire behaviour prediction options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FbpOptions {
    /// Account for slope.
    pub terrain_effect: Option<bool>,
    /// Account for wind.
    pub wind_effect: Option<bool>,
}

impl Default for FbpOptions {
    fn default() -> Self {
        Self {
            terrain_effect: Some(true),
            wind_effect: Some(true),
        }
    }
}

impl FbpOptions {
    /// Options with nothing set.
    pub fn unset() -> Self {
        Self {
            terrain_effect: None,
            wind_effect: None,
        }
    }

    /// Every problem with the block in `mode`.
    pub fn check(&self, mode: OptionMode) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_all(
            &mut errors,
            mode,
            &[
                ("terrainEffect", self.terrain_effect),
                ("windEffect", self.wind_effect),
            ],
        );
        errors
    }

    /// Appends the block's records for `mode`.
    pub fn encode(&self, mode: OptionMode, out: &mut RecordWriter) {
        encode_settings(
            out,
            mode,
            keywords::FBP_OPTIONS,
            keywords::FBP_SETTINGS,
            vec![
                ("terrainEffect", flag(self.terrain_effect)),
                ("windEffect", flag(self.wind_effect)),
            ],
        );
    }
}

/////////////////////////////////////////////////// FMC //////////////////////////////////////////////////

/// Foliar moisture content options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmcOptions {
    /// Percent override of the calculated FMC.
    pub per_override: Option<f64>,
    /// Elevation used where the landscape has no data.
    pub nodata_elev: Option<f64>,
    /// Use terrain when calculating FMC.
    pub terrain: Option<bool>,
    /// Use each cell's location rather than the landscape centre.
    pub accurate_location: Option<bool>,
}

impl Default for FmcOptions {
    fn default() -> Self {
        Self {
            per_override: None,
            nodata_elev: Some(0.0),
            terrain: Some(true),
            accurate_location: None,
        }
    }
}

impl FmcOptions {
    /// Options with nothing set.
    pub fn unset() -> Self {
        Self {
            per_override: None,
            nodata_elev: None,
            terrain: None,
            accurate_location: None,
        }
    }

    /// Every problem with the block in `mode`.
    pub fn check(&self, mode: OptionMode) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if mode == OptionMode::Normal {
            require(&mut errors, "nodataElev", &self.nodata_elev);
            require(&mut errors, "terrain", &self.terrain);
        }
        check_optional_range(&mut errors, "perOverride", self.per_override, PERCENT_OVERRIDE);
        check_optional_range(&mut errors, "nodataElev", self.nodata_elev, NODATA_ELEVATION);
        errors
    }

    /// Appends the block's records for `mode`.
    pub fn encode(&self, mode: OptionMode, out: &mut RecordWriter) {
        encode_settings(
            out,
            mode,
            keywords::FMC_OPTIONS,
            keywords::FMC_SETTINGS,
            vec![
                ("perOverride", num(self.per_override)),
                ("nodataElev", num(self.nodata_elev)),
                ("terrain", flag(self.terrain)),
                ("accurateLocation", flag(self.accurate_location)),
            ],
        );
    }
}

/////////////////////////////////////////////////// FWI //////////////////////////////////////////////////

/// Fire weather index calculation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FwiOptions {
    /// Interpolate FWI values spatially.
    pub fwi_spat_interp: Option<bool>,
    /// Calculate FWI values from spatially interpolated weather.
    pub fwi_from_spat_weather: Option<bool>,
    /// Recalculate history where weather was modified.
    pub history_on_effected_fwi: Option<bool>,
    /// Apply burning conditions.
    pub burning_conditions_on: Option<bool>,
    /// Interpolate FWI values over time.
    pub fwi_temporal_interp: Option<bool>,
}

impl Default for FwiOptions {
    fn default() -> Self {
        Self {
            fwi_spat_interp: Some(true),
            fwi_from_spat_weather: Some(false),
            history_on_effected_fwi: Some(false),
            burning_conditions_on: Some(true),
            fwi_temporal_interp: Some(false),
        }
    }
}

impl FwiOptions {
    /// Options with nothing set.
    pub fn unset() -> Self {
        Self {
            fwi_spat_interp: None,
            fwi_from_spat_weather: None,
            history_on_effected_fwi: None,
            burning_conditions_on: None,
            fwi_temporal_interp: None,
        }
    }

    fn flags(&self) -> [(&'static str, Option<bool>); 5] {
        [
            ("fwiSpatInterp", self.fwi_spat_interp),
            ("fwiFromSpatWeather", self.fwi_from_spat_weather),
            ("historyOnEffectedFWI", self.history_on_effected_fwi),
            ("burningConditionsOn", self.burning_conditions_on),
            ("fwiTemporalInterp", self.fwi_temporal_interp),
        ]
    }

    /// Every problem with the block in `mode`.
    pub fn check(&self, mode: OptionMode) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_all(&mut errors, mode, &self.flags());
        errors
    }

    /// Appends the block's records for `mode`.
    pub fn encode(&self, mode: OptionMode, out: &mut RecordWriter) {
        let settings = self
            .flags()
            .into_iter()
            .map(|(name, value)| (name, flag(value)))
            .collect();
        encode_settings(
            out,
            mode,
            keywords::FWI_OPTIONS,
            keywords::FWI_SETTINGS,
            settings,
        );
    }
}
