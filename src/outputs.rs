//! # Outputs
//!
//! Files the backend writes for each scenario, the per-timestep statistics it reports, the
//! destinations it streams results to, and the units used in exported files.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::attachment::is_safe_filename;
use crate::codec::{Encode, Fields, RecordWriter, keywords};
use crate::scenario::KnownIds;
use crate::validation::{
    Range, Validate, ValidationContext, ValidationError, check_optional_range, nest, require_text,
    validate_list,
};

const DISCRETIZE: Range = Range::closed(1.0, 1000.0);

/// An output produced for one named scenario.
pub trait ScenarioOutput {
    /// The scenario the output belongs to.
    fn scenario_name(&self) -> &str;
}

fn check_output_path(errors: &mut Vec<ValidationError>, property: &str, path: &str) {
    if path.trim().is_empty() {
        errors.push(ValidationError::new(property, "must not be empty"));
        return;
    }
    let basename = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if !is_safe_filename(basename) {
        errors.push(ValidationError::new(property, "is not a safe filename").with_value(path));
    }
}

fn check_output_file(errors: &mut Vec<ValidationError>, scenario_name: &str, filename: &str) {
    require_text(errors, "scenarioName", scenario_name);
    check_output_path(errors, "filename", filename);
}

fn check_discretize(errors: &mut Vec<ValidationError>, discretize: Option<i32>) {
    check_optional_range(errors, "discretize", discretize.map(f64::from), DISCRETIZE);
}

////////////////////////////////////////////// Enumerations //////////////////////////////////////////////

/// A value the backend can report per cell or per timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalStatistic {
    /// Simulation date and time.
    DateTime,
    /// Elapsed simulation time.
    ElapsedTime,
    /// Length of the timestep.
    TimestepDuration,
    /// Air temperature.
    Temperature,
    /// Dew point.
    DewPoint,
    /// Relative humidity.
    RelativeHumidity,
    /// Wind speed.
    WindSpeed,
    /// Wind direction.
    WindDirection,
    /// Precipitation.
    Precipitation,
    /// Hourly fine fuel moisture code.
    Hffmc,
    /// Initial spread index.
    Isi,
    /// Fire weather index.
    Fwi,
    /// Buildup index.
    Bui,
    /// Maximum rate of spread.
    MaxRos,
    /// Maximum fire intensity.
    MaxFi,
    /// Maximum crown fraction burned.
    MaxCfb,
    /// Total fuel consumed.
    Tfc,
    /// Burned area.
    TotalArea,
    /// Total perimeter length.
    TotalPerimeter,
    /// Active perimeter length.
    ActivePerimeter,
    /// Whether a cell burned.
    BurnGrid,
    /// First arrival time.
    FirstArrivalTime,
}

impl GlobalStatistic {
    fn wire_value(self) -> i64 {
        self as i64
    }
}

/// How grid values are interpolated from the simulation's vertices.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridInterpolation {
    /// Value of the closest vertex.
    Closest,
    /// Linear interpolation.
    Linear,
    /// Inverse distance weighting.
    #[default]
    Idw,
    /// Area weighting.
    AreaWeighting,
    /// Recalculated from the fire behaviour at each cell.
    Calculate,
    /// Discretized sub-cell sampling.
    Discretized,
    /// Voronoi overlap.
    VoronoiOverlap,
}

impl GridInterpolation {
    fn wire_value(self) -> i64 {
        self as i64
    }
}

/// Compression applied to exported grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridCompression {
    /// No compression.
    None,
    /// JPEG.
    Jpeg,
    /// LZW.
    Lzw,
    /// PackBits.
    PackBits,
    /// Deflate.
    Deflate,
    /// CCITT RLE.
    CcittRle,
    /// CCITT fax 3.
    CcittFax3,
    /// CCITT fax 4.
    CcittFax4,
}

impl GridCompression {
    fn wire_value(self) -> i64 {
        self as i64
    }
}

/// Format of a statistics file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsFileType {
    /// Picked from the filename extension.
    #[default]
    Detect,
    /// Comma separated values.
    Csv,
    /// JSON, one row per object.
    JsonRow,
    /// JSON, one column per array.
    JsonColumn,
    /// GeoJSON.
    GeoJson,
}

impl StatsFileType {
    fn wire_value(self) -> i64 {
        self as i64
    }
}

////////////////////////////////////////////// Summary files /////////////////////////////////////////////

/// A text summary of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryFile {
    /// The scenario summarized.
    pub scenario_name: String,
    /// Output filename.
    pub filename: String,
    /// Include application details.
    #[serde(default)]
    pub output_application: Option<bool>,
    /// Include geographic data.
    #[serde(default)]
    pub output_geo_data: Option<bool>,
    /// Include scenario arguments.
    #[serde(default)]
    pub output_scenario_args: Option<bool>,
    /// Include inputs.
    #[serde(default)]
    pub output_inputs: Option<bool>,
    /// Include landscape properties.
    #[serde(default)]
    pub output_landscape: Option<bool>,
    /// Include per-timestep details.
    #[serde(default)]
    pub output_time_steps: Option<bool>,
}

impl SummaryFile {
    /// A summary of `scenario_name` written to `filename`.
    pub fn new(scenario_name: &str, filename: &str) -> Self {
        Self {
            scenario_name: scenario_name.to_string(),
            filename: filename.to_string(),
            output_application: None,
            output_geo_data: None,
            output_scenario_args: None,
            output_inputs: None,
            output_landscape: None,
            output_time_steps: None,
        }
    }
}

impl ScenarioOutput for SummaryFile {
    fn scenario_name(&self) -> &str {
        &self.scenario_name
    }
}

impl Validate for SummaryFile {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_output_file(&mut errors, &self.scenario_name, &self.filename);
        errors
    }
}

impl Encode for SummaryFile {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::SUMMARY_FILE,
            Fields::new()
                .text(&self.scenario_name)
                .text(&self.filename)
                .opt_flag(self.output_application)
                .opt_flag(self.output_geo_data)
                .opt_flag(self.output_scenario_args)
                .opt_flag(self.output_inputs)
                .opt_flag(self.output_landscape)
                .opt_flag(self.output_time_steps),
        );
    }
}

////////////////////////////////////////////// Vector files //////////////////////////////////////////////

/// Attributes written alongside each exported perimeter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VectorMetadata {
    /// Application version.
    pub version: bool,
    /// Scenario name.
    pub scenario_name: bool,
    /// Job name.
    pub job_name: bool,
    /// Ignition name.
    pub ignition_name: bool,
    /// Simulation date.
    pub simulation_date: bool,
    /// Fire size.
    pub fire_size: bool,
    /// Total perimeter.
    pub perimeter_total: bool,
    /// Active perimeter.
    pub perimeter_active: bool,
    /// Weather values at the ignition.
    pub wx_values: bool,
    /// FWI values at the ignition.
    pub fwi_values: bool,
    /// Ignition location.
    pub ignition_location: bool,
    /// Maximum burn distance.
    pub max_burn_distance: bool,
    /// Ignition attributes.
    pub ignition_attributes: bool,
}

impl VectorMetadata {
    fn wire_fields(&self, fields: Fields) -> Fields {
        fields
            .flag(self.version)
            .flag(self.scenario_name)
            .flag(self.job_name)
            .flag(self.ignition_name)
            .flag(self.simulation_date)
            .flag(self.fire_size)
            .flag(self.perimeter_total)
            .flag(self.perimeter_active)
            .flag(self.wx_values)
            .flag(self.fwi_values)
            .flag(self.ignition_location)
            .flag(self.max_burn_distance)
            .flag(self.ignition_attributes)
    }
}

/// Fire perimeters exported as a vector file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorFile {
    /// The scenario exported.
    pub scenario_name: String,
    /// Output filename.
    pub filename: String,
    /// First perimeter time exported.
    #[serde(default)]
    pub perim_start_time: Option<DateTime<FixedOffset>>,
    /// Last perimeter time exported.
    #[serde(default)]
    pub perim_end_time: Option<DateTime<FixedOffset>>,
    /// Drop holes in the perimeters.
    #[serde(default)]
    pub remove_islands: bool,
    /// Merge perimeters that touch.
    #[serde(default)]
    pub merge_contact: bool,
    /// Export every perimeter rather than the last.
    #[serde(default)]
    pub mult_perim: bool,
    /// Only export active perimeters.
    #[serde(default)]
    pub perim_active: bool,
    /// Attributes to include.
    #[serde(default)]
    pub metadata: VectorMetadata,
    /// Sub-scenario to export, for scenarios with several.
    #[serde(default)]
    pub sub_scenario_name: Option<String>,
    /// Stream the file to the job's output streams.
    #[serde(default)]
    pub stream_output: bool,
}

impl VectorFile {
    /// Perimeters of `scenario_name` written to `filename`.
    pub fn new(scenario_name: &str, filename: &str) -> Self {
        Self {
            scenario_name: scenario_name.to_string(),
            filename: filename.to_string(),
            perim_start_time: None,
            perim_end_time: None,
            remove_islands: true,
            merge_contact: true,
            mult_perim: false,
            perim_active: false,
            metadata: VectorMetadata::default(),
            sub_scenario_name: None,
            stream_output: false,
        }
    }
}

impl ScenarioOutput for VectorFile {
    fn scenario_name(&self) -> &str {
        &self.scenario_name
    }
}

impl Validate for VectorFile {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_output_file(&mut errors, &self.scenario_name, &self.filename);
        if let (Some(start), Some(end)) = (&self.perim_start_time, &self.perim_end_time) {
            if end < start {
                errors.push(
                    ValidationError::new("perimEndTime", "must not be before the start time")
                        .with_value(end.to_rfc3339()),
                );
            }
        }
        errors
    }
}

impl Encode for VectorFile {
    fn encode(&self, out: &mut RecordWriter) {
        let fields = Fields::new()
            .text(&self.scenario_name)
            .text(&self.filename)
            .opt_time(self.perim_start_time.as_ref())
            .opt_time(self.perim_end_time.as_ref())
            .flag(self.remove_islands)
            .flag(self.merge_contact)
            .flag(self.mult_perim)
            .flag(self.perim_active);
        let fields = self
            .metadata
            .wire_fields(fields)
            .opt_text(self.sub_scenario_name.as_deref())
            .flag(self.stream_output);
        out.record(keywords::VECTOR_FILE, fields);
    }
}

/////////////////////////////////////////////// Grid files ///////////////////////////////////////////////

/// One statistic exported as a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridOutput {
    /// The scenario exported.
    pub scenario_name: String,
    /// Output filename.
    pub filename: String,
    /// Time the grid is exported at.
    #[serde(default)]
    pub output_time: Option<DateTime<FixedOffset>>,
    /// Start of the window accumulated into the grid.
    #[serde(default)]
    pub start_output_time: Option<DateTime<FixedOffset>>,
    /// The statistic exported.
    pub statistic: GlobalStatistic,
    /// How cell values are interpolated.
    #[serde(default)]
    pub interpolation: GridInterpolation,
    /// Sub-cell sampling factor, for [`GridInterpolation::Discretized`].
    #[serde(default)]
    pub discretize: Option<i32>,
    /// Compression of the exported grid.
    #[serde(default)]
    pub compression: Option<GridCompression>,
    /// Crop the grid to the burned area.
    #[serde(default)]
    pub minimize_output: Option<bool>,
    /// Sub-scenario to export.
    #[serde(default)]
    pub sub_scenario_name: Option<String>,
    /// Stream the file to the job's output streams.
    #[serde(default)]
    pub stream_output: bool,
}

impl GridOutput {
    /// `statistic` of `scenario_name` written to `filename`.
    pub fn new(scenario_name: &str, filename: &str, statistic: GlobalStatistic) -> Self {
        Self {
            scenario_name: scenario_name.to_string(),
            filename: filename.to_string(),
            output_time: None,
            start_output_time: None,
            statistic,
            interpolation: GridInterpolation::default(),
            discretize: None,
            compression: None,
            minimize_output: None,
            sub_scenario_name: None,
            stream_output: false,
        }
    }
}

impl ScenarioOutput for GridOutput {
    fn scenario_name(&self) -> &str {
        &self.scenario_name
    }
}

impl Validate for GridOutput {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_output_file(&mut errors, &self.scenario_name, &self.filename);
        check_discretize(&mut errors, self.discretize);
        if self.interpolation == GridInterpolation::Discretized && self.discretize.is_none() {
            errors.push(ValidationError::new(
                "discretize",
                "is required for discretized interpolation",
            ));
        }
        errors
    }
}

impl Encode for GridOutput {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::GRID_FILE,
            Fields::new()
                .text(&self.scenario_name)
                .text(&self.filename)
                .opt_time(self.output_time.as_ref())
                .opt_time(self.start_output_time.as_ref())
                .int(self.statistic.wire_value())
                .int(self.interpolation.wire_value())
                .opt_int(self.discretize.map(i64::from))
                .opt_int(self.compression.map(GridCompression::wire_value))
                .opt_flag(self.minimize_output)
                .opt_text(self.sub_scenario_name.as_deref())
                .flag(self.stream_output),
        );
    }
}

/// The fuel map, as modified by patches, exported as a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelGridExport {
    /// The scenario exported.
    pub scenario_name: String,
    /// Output filename.
    pub filename: String,
    /// Compression of the exported grid.
    #[serde(default)]
    pub compression: Option<GridCompression>,
    /// Sub-scenario to export.
    #[serde(default)]
    pub sub_scenario_name: Option<String>,
    /// Stream the file to the job's output streams.
    #[serde(default)]
    pub stream_output: bool,
}

impl FuelGridExport {
    /// The fuel grid of `scenario_name` written to `filename`.
    pub fn new(scenario_name: &str, filename: &str) -> Self {
        Self {
            scenario_name: scenario_name.to_string(),
            filename: filename.to_string(),
            compression: None,
            sub_scenario_name: None,
            stream_output: false,
        }
    }
}

impl ScenarioOutput for FuelGridExport {
    fn scenario_name(&self) -> &str {
        &self.scenario_name
    }
}

impl Validate for FuelGridExport {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_output_file(&mut errors, &self.scenario_name, &self.filename);
        errors
    }
}

impl Encode for FuelGridExport {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::FUEL_GRID_EXPORT,
            Fields::new()
                .text(&self.scenario_name)
                .text(&self.filename)
                .opt_int(self.compression.map(GridCompression::wire_value))
                .opt_text(self.sub_scenario_name.as_deref())
                .flag(self.stream_output),
        );
    }
}

/////////////////////////////////////////////// Statistics ///////////////////////////////////////////////

/// Per-timestep statistics of a scenario, as a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsFile {
    /// The scenario reported.
    pub scenario_name: String,
    /// Output filename.
    pub filename: String,
    /// Table format.
    #[serde(default)]
    pub file_type: StatsFileType,
    /// Sub-cell sampling factor.
    #[serde(default)]
    pub discretize: Option<i32>,
    /// Stream the file to the job's output streams.
    #[serde(default)]
    pub stream_output: Option<bool>,
    /// Columns in output order.
    pub columns: Vec<GlobalStatistic>,
}

impl StatsFile {
    /// A table of `columns` for `scenario_name` written to `filename`.
    pub fn new(scenario_name: &str, filename: &str, columns: Vec<GlobalStatistic>) -> Self {
        Self {
            scenario_name: scenario_name.to_string(),
            filename: filename.to_string(),
            file_type: StatsFileType::default(),
            discretize: None,
            stream_output: None,
            columns,
        }
    }
}

impl ScenarioOutput for StatsFile {
    fn scenario_name(&self) -> &str {
        &self.scenario_name
    }
}

impl Validate for StatsFile {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_output_file(&mut errors, &self.scenario_name, &self.filename);
        check_discretize(&mut errors, self.discretize);
        if self.columns.is_empty() {
            errors.push(ValidationError::new("columns", "at least one column is required"));
        }
        errors
    }
}

impl Encode for StatsFile {
    fn encode(&self, out: &mut RecordWriter) {
        let mut fields = Fields::new()
            .text(&self.scenario_name)
            .text(&self.filename)
            .int(self.file_type.wire_value())
            .opt_int(self.discretize.map(i64::from))
            .opt_flag(self.stream_output)
            .int(self.columns.len() as i64);
        for column in &self.columns {
            fields = fields.int(column.wire_value());
        }
        out.record(keywords::STATS_FILE, fields);
    }
}

/// Arrival statistics for the assets a scenario tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStatsExport {
    /// The scenario reported.
    pub scenario_name: String,
    /// Output filename.
    pub filename: String,
    /// Table format.
    #[serde(default)]
    pub file_type: StatsFileType,
    /// Embed the critical path in the table.
    #[serde(default)]
    pub critical_path_embedded: bool,
    /// Separate file for the critical path.
    #[serde(default)]
    pub critical_path_file: Option<String>,
    /// Stream the file to the job's output streams.
    #[serde(default)]
    pub stream_output: bool,
}

impl AssetStatsExport {
    /// Asset statistics of `scenario_name` written to `filename`.
    pub fn new(scenario_name: &str, filename: &str) -> Self {
        Self {
            scenario_name: scenario_name.to_string(),
            filename: filename.to_string(),
            file_type: StatsFileType::default(),
            critical_path_embedded: false,
            critical_path_file: None,
            stream_output: false,
        }
    }
}

impl ScenarioOutput for AssetStatsExport {
    fn scenario_name(&self) -> &str {
        &self.scenario_name
    }
}

impl Validate for AssetStatsExport {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_output_file(&mut errors, &self.scenario_name, &self.filename);
        if let Some(path) = &self.critical_path_file {
            check_output_path(&mut errors, "criticalPathFile", path);
        }
        errors
    }
}

impl Encode for AssetStatsExport {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::ASSET_STATS_EXPORT,
            Fields::new()
                .text(&self.scenario_name)
                .text(&self.filename)
                .int(self.file_type.wire_value())
                .flag(self.critical_path_embedded)
                .opt_text(self.critical_path_file.as_deref())
                .flag(self.stream_output),
        );
    }
}

/// Statistics the backend reports after every timestep.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestepSettings {
    /// The statistics reported.
    #[serde(default)]
    pub statistics: Vec<GlobalStatistic>,
    /// Sub-cell sampling factor.
    #[serde(default)]
    pub discretize: Option<i32>,
}

impl Validate for TimestepSettings {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_discretize(&mut errors, self.discretize);
        errors
    }
}

impl Encode for TimestepSettings {
    fn encode(&self, out: &mut RecordWriter) {
        for statistic in &self.statistics {
            out.record(
                keywords::MNG_STATISTIC,
                Fields::new()
                    .int(statistic.wire_value())
                    .opt_int(self.discretize.map(i64::from)),
            );
        }
    }
}

///////////////////////////////////////////////// Streams ////////////////////////////////////////////////

/// Where the backend publishes results while a job runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OutputStream {
    /// An MQTT broker.
    Mqtt {
        /// Broker host.
        host: String,
        /// Broker port.
        port: u16,
        /// Topic prefix.
        topic: String,
        /// Username, if the broker needs one.
        #[serde(default)]
        username: Option<String>,
        /// Password, if the broker needs one.
        #[serde(default)]
        password: Option<String>,
    },
    /// A GeoServer instance.
    #[serde(rename = "geoserver")]
    GeoServer {
        /// Base URL.
        url: String,
        /// Username.
        username: String,
        /// Password.
        password: String,
        /// Workspace to publish to.
        workspace: String,
        /// Coverage store name.
        coverage: String,
        /// Spatial reference of published layers.
        #[serde(default)]
        srs: Option<String>,
    },
}

impl Validate for OutputStream {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match self {
            OutputStream::Mqtt { host, port, topic, .. } => {
                require_text(&mut errors, "host", host);
                if *port == 0 {
                    errors.push(ValidationError::new("port", "must not be zero"));
                }
                require_text(&mut errors, "topic", topic);
            }
            OutputStream::GeoServer {
                url,
                workspace,
                coverage,
                ..
            } => {
                if url::Url::parse(url).is_err() {
                    errors.push(ValidationError::new("url", "is not a valid URL").with_value(url));
                }
                require_text(&mut errors, "workspace", workspace);
                require_text(&mut errors, "coverage", coverage);
            }
        }
        errors
    }
}

impl Encode for OutputStream {
    fn encode(&self, out: &mut RecordWriter) {
        let fields = match self {
            OutputStream::Mqtt {
                host,
                port,
                topic,
                username,
                password,
            } => Fields::new()
                .raw("mqtt")
                .text(host)
                .int((*port).into())
                .text(topic)
                .opt_text(username.as_deref())
                .opt_text(password.as_deref()),
            OutputStream::GeoServer {
                url,
                username,
                password,
                workspace,
                coverage,
                srs,
            } => Fields::new()
                .raw("geoserver")
                .text(url)
                .text(username)
                .text(password)
                .text(workspace)
                .text(coverage)
                .opt_text(srs.as_deref()),
        };
        out.record(keywords::OUTPUT_STREAM, fields);
    }
}

////////////////////////////////////////////////// Units /////////////////////////////////////////////////

/// The kind of quantity a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCategory {
    /// Lengths.
    Distance,
    /// Areas.
    Area,
    /// Speeds.
    Velocity,
    /// Fire intensities.
    Intensity,
    /// Temperatures.
    Temperature,
    /// Angles.
    Angle,
}

/// A unit for exported values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// km
    Kilometre,
    /// m
    Metre,
    /// cm
    Centimetre,
    /// mi
    Mile,
    /// ft
    Foot,
    /// ch
    Chain,
    /// km²
    SquareKilometre,
    /// m²
    SquareMetre,
    /// ha
    Hectare,
    /// ac
    Acre,
    /// mi²
    SquareMile,
    /// km/h
    KilometresPerHour,
    /// m/s
    MetresPerSecond,
    /// m/min
    MetresPerMinute,
    /// mph
    MilesPerHour,
    /// ft/min
    FeetPerMinute,
    /// ch/h
    ChainsPerHour,
    /// kW/m
    KilowattsPerMetre,
    /// BTU/ft/s
    BtuPerFootSecond,
    /// °C
    Celsius,
    /// °F
    Fahrenheit,
    /// K
    Kelvin,
    /// degrees
    Degree,
    /// radians
    Radian,
    /// compass degrees
    CompassDegree,
}

impl Unit {
    /// The category the unit measures.
    pub fn category(self) -> UnitCategory {
        use Unit::*;
        match self {
            Kilometre | Metre | Centimetre | Mile | Foot | Chain => UnitCategory::Distance,
            SquareKilometre | SquareMetre | Hectare | Acre | SquareMile => UnitCategory::Area,
            KilometresPerHour | MetresPerSecond | MetresPerMinute | MilesPerHour
            | FeetPerMinute | ChainsPerHour => UnitCategory::Velocity,
            KilowattsPerMetre | BtuPerFootSecond => UnitCategory::Intensity,
            Celsius | Fahrenheit | Kelvin => UnitCategory::Temperature,
            Degree | Radian | CompassDegree => UnitCategory::Angle,
        }
    }

    /// The name the backend uses.
    pub fn wire_name(self) -> &'static str {
        use Unit::*;
        match self {
            Kilometre => "km",
            Metre => "m",
            Centimetre => "cm",
            Mile => "mi",
            Foot => "ft",
            Chain => "ch",
            SquareKilometre => "km2",
            SquareMetre => "m2",
            Hectare => "ha",
            Acre => "ac",
            SquareMile => "mi2",
            KilometresPerHour => "km/h",
            MetresPerSecond => "m/s",
            MetresPerMinute => "m/min",
            MilesPerHour => "mph",
            FeetPerMinute => "ft/min",
            ChainsPerHour => "ch/h",
            KilowattsPerMetre => "kW/m",
            BtuPerFootSecond => "BTU/ft/s",
            Celsius => "C",
            Fahrenheit => "F",
            Kelvin => "K",
            Degree => "deg",
            Radian => "rad",
            CompassDegree => "compass",
        }
    }
}

/// Units used in exported files, where they differ from the backend's defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportUnits {
    /// Unit for lengths.
    pub distance: Option<Unit>,
    /// Unit for areas.
    pub area: Option<Unit>,
    /// Unit for speeds.
    pub velocity: Option<Unit>,
    /// Unit for intensities.
    pub intensity: Option<Unit>,
    /// Unit for temperatures.
    pub temperature: Option<Unit>,
    /// Unit for angles.
    pub angle: Option<Unit>,
}

impl ExportUnits {
    fn fields(&self) -> [(&'static str, Option<Unit>, UnitCategory); 6] {
        [
            ("distance", self.distance, UnitCategory::Distance),
            ("area", self.area, UnitCategory::Area),
            ("velocity", self.velocity, UnitCategory::Velocity),
            ("intensity", self.intensity, UnitCategory::Intensity),
            ("temperature", self.temperature, UnitCategory::Temperature),
            ("angle", self.angle, UnitCategory::Angle),
        ]
    }

    /// Whether no unit is set.
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, unit, _)| unit.is_none())
    }
}

impl Validate for ExportUnits {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        self.fields()
            .into_iter()
            .filter_map(|(name, unit, category)| match unit {
                Some(unit) if unit.category() != category => Some(
                    ValidationError::new(name, format!("is not a {:?} unit", category).to_lowercase())
                        .with_value(unit.wire_name()),
                ),
                _ => None,
            })
            .collect()
    }
}

impl Encode for ExportUnits {
    fn encode(&self, out: &mut RecordWriter) {
        if self.is_empty() {
            return;
        }
        let fields = self
            .fields()
            .into_iter()
            .fold(Fields::new(), |fields, (_, unit, _)| {
                fields.opt_text(unit.map(Unit::wire_name))
            });
        out.record(keywords::EXPORT_UNITS, fields);
    }
}

///////////////////////////////////////////////// Outputs ////////////////////////////////////////////////

/// Everything a job asks the backend to produce.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Outputs {
    /// Summary files.
    pub summary_files: Vec<SummaryFile>,
    /// Vector files.
    pub vector_files: Vec<VectorFile>,
    /// Grid files.
    pub grid_files: Vec<GridOutput>,
    /// Fuel grid exports.
    pub fuel_grid_files: Vec<FuelGridExport>,
    /// Statistics files.
    pub stats_files: Vec<StatsFile>,
    /// Asset statistics files.
    pub asset_stats_files: Vec<AssetStatsExport>,
    /// Per-timestep statistics.
    pub timestep_settings: Option<TimestepSettings>,
    /// Streaming destinations.
    pub streams: Vec<OutputStream>,
    /// Units of exported values.
    pub export_units: ExportUnits,
}

fn check_files<T: Validate + ScenarioOutput>(
    items: &[T],
    ctx: &ValidationContext,
    known: Option<&KnownIds<'_>>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let mut errs = item.check_valid(ctx);
        let name = item.scenario_name();
        if !name.is_empty() && known.is_some_and(|k| !k.scenarios.contains(name)) {
            errs.push(
                ValidationError::new("scenarioName", "no scenario with this id exists in the job")
                    .with_value(name),
            );
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

impl Outputs {
    /// Whether no output of any kind is requested.
    pub fn is_empty(&self) -> bool {
        self.summary_files.is_empty()
            && self.vector_files.is_empty()
            && self.grid_files.is_empty()
            && self.fuel_grid_files.is_empty()
            && self.stats_files.is_empty()
            && self.asset_stats_files.is_empty()
            && self.timestep_settings.is_none()
            && self.streams.is_empty()
            && self.export_units.is_empty()
    }

    /// Validates every output except the export units, resolving scenario names against `known`
    /// when given.
    pub fn check_with(
        &self,
        ctx: &ValidationContext,
        known: Option<&KnownIds<'_>>,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        nest(&mut errors, "summaryFiles", check_files(&self.summary_files, ctx, known));
        nest(&mut errors, "vectorFiles", check_files(&self.vector_files, ctx, known));
        nest(&mut errors, "gridFiles", check_files(&self.grid_files, ctx, known));
        nest(&mut errors, "fuelGridFiles", check_files(&self.fuel_grid_files, ctx, known));
        nest(&mut errors, "statsFiles", check_files(&self.stats_files, ctx, known));
        nest(
            &mut errors,
            "assetStatsFiles",
            check_files(&self.asset_stats_files, ctx, known),
        );
        if let Some(settings) = &self.timestep_settings {
            nest(&mut errors, "timestepSettings", settings.check_valid(ctx));
        }
        nest(&mut errors, "streams", validate_list(&self.streams, ctx));
        errors
    }
}

impl Validate for Outputs {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        self.check_with(ctx, None)
    }
}

impl Encode for Outputs {
    fn encode(&self, out: &mut RecordWriter) {
        self.summary_files.encode(out);
        self.vector_files.encode(out);
        self.grid_files.encode(out);
        self.fuel_grid_files.encode(out);
        self.stats_files.encode(out);
        self.asset_stats_files.encode(out);
        if let Some(settings) = &self.timestep_settings {
            settings.encode(out);
        }
        self.streams.encode(out);
        self.export_units.encode(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ValidationContext {
        ValidationContext::default()
    }

    #[test]
    fn empty_outputs_write_nothing() {
        let outputs = Outputs::default();
        assert!(outputs.is_empty());
        assert!(outputs.is_valid(&ctx()));
        let mut out = RecordWriter::new();
        outputs.encode(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn output_filename_rules() {
        assert!(VectorFile::new("scen0", "out/perimeter.kml").is_valid(&ctx()));
        let errors = VectorFile::new("", "out/aux.kml").check_valid(&ctx());
        let names: Vec<_> = errors.iter().map(|e| e.property_name.as_str()).collect();
        assert_eq!(names, vec!["scenarioName", "filename"]);
    }

    #[test]
    fn grid_discretize_range() {
        let mut grid = GridOutput::new("scen0", "ros.tif", GlobalStatistic::MaxRos);
        grid.discretize = Some(1000);
        assert!(grid.is_valid(&ctx()));
        grid.discretize = Some(1001);
        assert_eq!(grid.check_valid(&ctx())[0].property_name, "discretize");
        grid.discretize = None;
        grid.interpolation = GridInterpolation::Discretized;
        assert!(!grid.is_valid(&ctx()));
    }

    #[test]
    fn stats_need_columns() {
        let stats = StatsFile::new("scen0", "stats.csv", vec![]);
        assert_eq!(stats.check_valid(&ctx())[0].property_name, "columns");
    }

    #[test]
    fn unknown_scenario_names_are_reported() {
        let outputs = Outputs {
            summary_files: vec![SummaryFile::new("scen9", "summary.txt")],
            ..Outputs::default()
        };
        let mut known = KnownIds::default();
        known.scenarios.insert("scen0");
        let errors = outputs.check_with(&ctx(), Some(&known));
        assert_eq!(errors[0].property_name, "summaryFiles");
        assert_eq!(errors[0].children[0].children[0].property_name, "scenarioName");
        assert!(outputs.is_valid(&ctx()));
    }

    #[test]
    fn units_must_match_their_field() {
        let units = ExportUnits {
            distance: Some(Unit::Hectare),
            velocity: Some(Unit::KilometresPerHour),
            ..ExportUnits::default()
        };
        let errors = units.check_valid(&ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property_name, "distance");
        assert_eq!(errors[0].value.as_deref(), Some("ha"));
    }

    #[test]
    fn units_record_uses_nulls() {
        let units = ExportUnits {
            area: Some(Unit::Hectare),
            ..ExportUnits::default()
        };
        let mut out = RecordWriter::new();
        units.encode(&mut out);
        assert_eq!(
            out.finish().data_for("export_units"),
            vec!["null|ha|null|null|null|null"]
        );
    }

    #[test]
    fn stream_and_statistic_records() {
        let outputs = Outputs {
            timestep_settings: Some(TimestepSettings {
                statistics: vec![GlobalStatistic::TotalArea, GlobalStatistic::Fwi],
                discretize: None,
            }),
            streams: vec![OutputStream::Mqtt {
                host: "broker.local".to_string(),
                port: 1883,
                topic: "wise".to_string(),
                username: None,
                password: None,
            }],
            ..Outputs::default()
        };
        let mut out = RecordWriter::new();
        outputs.encode(&mut out);
        let message = out.finish();
        assert_eq!(
            message.keywords(),
            vec!["mng_statistic", "mng_statistic", "output_stream"]
        );
        assert_eq!(message.data_for("output_stream")[0], "mqtt|broker.local|1883|wise|null|null");
    }

    #[test]
    fn geoserver_url_must_parse() {
        let stream = OutputStream::GeoServer {
            url: "not a url".to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
            workspace: "fires".to_string(),
            coverage: "growth".to_string(),
            srs: None,
        };
        assert_eq!(stream.check_valid(&ctx())[0].property_name, "url");
    }
}
