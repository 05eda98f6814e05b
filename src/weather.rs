//! # Weather
//!
//! Weather stations own the streams recorded at them.  Patches and grids modify the weather
//! over part of the landscape and are layered into scenarios by id.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::codec::{Encode, Fields, RecordWriter, keywords};
use crate::duration::WiseDuration;
use crate::geometry::{LatLon, PatchSource, check_patch_source};
use crate::ids::{Identified, deserialize_sanitized, impl_identified};
use crate::validation::{
    Range, Validate, ValidationContext, ValidationError, check_file, check_optional_range,
    check_range, nest, validate_collection,
};

const FFMC: Range = Range::closed(0.0, 101.0);
const DMC: Range = Range::closed(0.0, 500.0);
const DC: Range = Range::closed(0.0, 1500.0);
const PRECIPITATION: Range = Range::at_least(0.0);
const HFFMC_HOUR: Range = Range::closed(-1.0, 23.0);
const DIURNAL: Range = Range::closed(-10.0, 10.0);
const RELATIVE_HUMIDITY: Range = Range::closed(0.0, 100.0);
const WIND_DIRECTION: Range = Range::half_open(0.0, 360.0);
const WIND_SPEED: Range = Range::closed(0.0, 250.0);
const TIME_OF_DAY_SECONDS: Range = Range::closed(0.0, 86_400.0);

/// Checks a time-of-day offset lies within one day.
pub(crate) fn check_time_of_day(
    errors: &mut Vec<ValidationError>,
    property: &str,
    value: &WiseDuration,
) {
    let seconds = value.total_seconds();
    if value.is_negative() || !TIME_OF_DAY_SECONDS.contains(seconds) {
        errors.push(ValidationError::new(property, "must be within one day").with_value(value));
    }
}

/// Checks that both ends of a time window are set and in order.
pub(crate) fn check_time_window(
    errors: &mut Vec<ValidationError>,
    start: Option<&DateTime<FixedOffset>>,
    end: Option<&DateTime<FixedOffset>>,
) {
    match (start, end) {
        (Some(start), Some(end)) => {
            if start >= end {
                errors.push(
                    ValidationError::new("endTime", "must be after the start time")
                        .with_value(end.to_rfc3339()),
                );
            }
        }
        (start, end) => {
            if start.is_none() {
                errors.push(ValidationError::new("startTime", "is required"));
            }
            if end.is_none() {
                errors.push(ValidationError::new("endTime", "is required"));
            }
        }
    }
}

//////////////////////////////////////////////// Stations ////////////////////////////////////////////////

/// A location where weather was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherStation {
    #[serde(deserialize_with = "deserialize_sanitized")]
    id: String,
    /// Where the station is.
    pub location: LatLon,
    /// Elevation in metres.
    #[serde(default)]
    pub elevation: Option<f64>,
    /// Free text.
    #[serde(default)]
    pub comments: String,
    /// Streams recorded at this station.
    #[serde(default)]
    pub streams: Vec<WeatherStream>,
}

impl_identified!(WeatherStation);

impl WeatherStation {
    pub(crate) fn new(id: String, location: LatLon) -> Self {
        Self {
            id,
            location,
            elevation: None,
            comments: String::new(),
            streams: Vec::new(),
        }
    }

    /// The stream with `id`, if this station owns one.
    pub fn stream(&self, id: &str) -> Option<&WeatherStream> {
        self.streams.iter().find(|s| s.id() == id)
    }

    /// Mutable access to the stream with `id`.
    pub fn stream_mut(&mut self, id: &str) -> Option<&mut WeatherStream> {
        self.streams.iter_mut().find(|s| s.id() == id)
    }
}

impl Validate for WeatherStation {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        nest(&mut errors, "location", self.location.check_valid(ctx));
        let streams = validate_collection(&self.streams, ctx, |_, _| Vec::new());
        nest(&mut errors, "streams", streams);
        errors
    }
}

impl Encode for WeatherStation {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::WEATHER_STATION,
            Fields::new()
                .raw(&self.id)
                .num(self.location.latitude)
                .num(self.location.longitude)
                .opt_num(self.elevation)
                .text(&self.comments),
        );
        for stream in &self.streams {
            stream.encode_under(&self.id, out);
        }
    }
}

//////////////////////////////////////////////// Streams /////////////////////////////////////////////////

/// How hourly FFMC is calculated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HffmcMethod {
    /// Van Wagner's hourly FFMC.
    #[default]
    VanWagner,
    /// Lawson's diurnal interpolation.
    Lawson,
}

impl HffmcMethod {
    fn wire_value(self) -> i64 {
        match self {
            HffmcMethod::VanWagner => 0,
            HffmcMethod::Lawson => 1,
        }
    }
}

/// Parameters for building hourly values from daily observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiurnalParameters {
    /// Temperature alpha.
    pub temperature_alpha: f64,
    /// Temperature beta.
    pub temperature_beta: f64,
    /// Temperature gamma.
    pub temperature_gamma: f64,
    /// Wind alpha.
    pub wind_alpha: f64,
    /// Wind beta.
    pub wind_beta: f64,
    /// Wind gamma.
    pub wind_gamma: f64,
}

impl Validate for DiurnalParameters {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_range(&mut errors, "temperatureAlpha", self.temperature_alpha, DIURNAL);
        check_range(&mut errors, "temperatureBeta", self.temperature_beta, DIURNAL);
        check_range(&mut errors, "temperatureGamma", self.temperature_gamma, DIURNAL);
        check_range(&mut errors, "windAlpha", self.wind_alpha, DIURNAL);
        check_range(&mut errors, "windBeta", self.wind_beta, DIURNAL);
        check_range(&mut errors, "windGamma", self.wind_gamma, DIURNAL);
        errors
    }
}

/// A weather file recorded at a station, with the codes needed to start the FWI calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherStream {
    #[serde(deserialize_with = "deserialize_sanitized")]
    id: String,
    /// The weather file or attachment.
    pub filename: String,
    /// Starting hourly FFMC.
    pub hffmc_value: f64,
    /// Hour the starting HFFMC applies to, or -1 for the default.
    pub hffmc_hour: i32,
    /// How HFFMC is calculated.
    #[serde(default)]
    pub hffmc_method: HffmcMethod,
    /// Starting fine fuel moisture code.
    pub starting_ffmc: f64,
    /// Starting duff moisture code.
    pub starting_dmc: f64,
    /// Starting drought code.
    pub starting_dc: f64,
    /// Precipitation in the preceding day.
    pub starting_precip: f64,
    /// First day of data used.
    pub start_date: NaiveDate,
    /// Last day of data used.
    pub end_date: NaiveDate,
    /// Diurnal curve overrides.
    #[serde(default)]
    pub diurnal: Option<DiurnalParameters>,
    /// Free text.
    #[serde(default)]
    pub comments: String,
}

impl_identified!(WeatherStream);

impl WeatherStream {
    pub(crate) fn new(id: String, filename: &str, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id,
            filename: filename.to_string(),
            hffmc_value: 85.0,
            hffmc_hour: -1,
            hffmc_method: HffmcMethod::default(),
            starting_ffmc: 85.0,
            starting_dmc: 6.0,
            starting_dc: 15.0,
            starting_precip: 0.0,
            start_date,
            end_date,
            diurnal: None,
            comments: String::new(),
        }
    }

    fn encode_under(&self, station_id: &str, out: &mut RecordWriter) {
        let diurnal = self.diurnal.as_ref();
        out.record(
            keywords::WEATHER_STREAM,
            Fields::new()
                .raw(station_id)
                .raw(&self.id)
                .text(&self.filename)
                .num(self.hffmc_value)
                .int(self.hffmc_hour.into())
                .int(self.hffmc_method.wire_value())
                .num(self.starting_ffmc)
                .num(self.starting_dmc)
                .num(self.starting_dc)
                .num(self.starting_precip)
                .date(&self.start_date)
                .date(&self.end_date)
                .opt_num(diurnal.map(|d| d.temperature_alpha))
                .opt_num(diurnal.map(|d| d.temperature_beta))
                .opt_num(diurnal.map(|d| d.temperature_gamma))
                .opt_num(diurnal.map(|d| d.wind_alpha))
                .opt_num(diurnal.map(|d| d.wind_beta))
                .opt_num(diurnal.map(|d| d.wind_gamma))
                .text(&self.comments),
        );
    }
}

impl Validate for WeatherStream {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_file(&mut errors, ctx, "filename", &self.filename);
        check_range(&mut errors, "hffmcValue", self.hffmc_value, FFMC);
        check_range(&mut errors, "hffmcHour", self.hffmc_hour.into(), HFFMC_HOUR);
        check_range(&mut errors, "startingFfmc", self.starting_ffmc, FFMC);
        check_range(&mut errors, "startingDmc", self.starting_dmc, DMC);
        check_range(&mut errors, "startingDc", self.starting_dc, DC);
        check_range(&mut errors, "startingPrecip", self.starting_precip, PRECIPITATION);
        if self.start_date > self.end_date {
            errors.push(
                ValidationError::new("endDate", "must not be before the start date")
                    .with_value(self.end_date),
            );
        }
        if let Some(diurnal) = &self.diurnal {
            nest(&mut errors, "diurnal", diurnal.check_valid(ctx));
        }
        errors
    }
}

//////////////////////////////////////////////// Patches /////////////////////////////////////////////////

/// How a patch combines its value with the existing weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOperation {
    /// Replace the value.
    Equal,
    /// Add to the value.
    Plus,
    /// Subtract from the value.
    Minus,
    /// Multiply the value.
    Multiply,
    /// Divide the value.
    Divide,
}

impl PatchOperation {
    fn wire_value(self) -> i64 {
        match self {
            PatchOperation::Equal => 0,
            PatchOperation::Plus => 1,
            PatchOperation::Minus => 2,
            PatchOperation::Multiply => 3,
            PatchOperation::Divide => 4,
        }
    }
}

/// One operation applied to one weather variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchDelta {
    /// The operation.
    pub operation: PatchOperation,
    /// The operand.
    pub value: f64,
}

impl PatchDelta {
    /// `operation` applied with `value`.
    pub fn new(operation: PatchOperation, value: f64) -> Self {
        Self { operation, value }
    }

    fn check(&self, errors: &mut Vec<ValidationError>, property: &str, absolute: Option<Range>) {
        if self.operation == PatchOperation::Divide && self.value == 0.0 {
            errors.push(ValidationError::new(property, "cannot divide by zero").with_value(0));
        }
        if let (PatchOperation::Equal, Some(range)) = (self.operation, absolute) {
            check_range(errors, property, self.value, range);
        }
    }
}

fn delta_fields(fields: Fields, delta: Option<&PatchDelta>) -> Fields {
    match delta {
        Some(delta) => fields.int(delta.operation.wire_value()).num(delta.value),
        None => fields.null().null(),
    }
}

/// Modifies weather over an area for a window of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPatch {
    #[serde(deserialize_with = "deserialize_sanitized")]
    id: String,
    /// When the patch starts to apply.
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    /// When the patch stops applying.
    #[serde(default)]
    pub end_time: Option<DateTime<FixedOffset>>,
    /// Daily start, as an offset from midnight.
    #[serde(default)]
    pub start_time_of_day: WiseDuration,
    /// Daily end, as an offset from midnight.
    #[serde(default)]
    pub end_time_of_day: WiseDuration,
    /// The area the patch covers.
    #[serde(default)]
    pub source: Option<PatchSource>,
    /// Temperature change.
    #[serde(default)]
    pub temperature: Option<PatchDelta>,
    /// Relative humidity change.
    #[serde(default)]
    pub relative_humidity: Option<PatchDelta>,
    /// Precipitation change.
    #[serde(default)]
    pub precipitation: Option<PatchDelta>,
    /// Wind speed change.
    #[serde(default)]
    pub wind_speed: Option<PatchDelta>,
    /// Wind direction change.
    #[serde(default)]
    pub wind_direction: Option<PatchDelta>,
    /// Free text.
    #[serde(default)]
    pub comments: String,
}

impl_identified!(WeatherPatch);

impl WeatherPatch {
    pub(crate) fn new(id: String) -> Self {
        Self {
            id,
            start_time: None,
            end_time: None,
            start_time_of_day: WiseDuration::zero(),
            end_time_of_day: WiseDuration::from_hours(23).with_minutes(59).with_seconds(59.0),
            source: None,
            temperature: None,
            relative_humidity: None,
            precipitation: None,
            wind_speed: None,
            wind_direction: None,
            comments: String::new(),
        }
    }
}

impl Validate for WeatherPatch {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_time_window(&mut errors, self.start_time.as_ref(), self.end_time.as_ref());
        check_time_of_day(&mut errors, "startTimeOfDay", &self.start_time_of_day);
        check_time_of_day(&mut errors, "endTimeOfDay", &self.end_time_of_day);
        check_patch_source(&mut errors, ctx, self.source.as_ref());
        let deltas = [
            ("temperature", self.temperature.as_ref(), None),
            ("relativeHumidity", self.relative_humidity.as_ref(), Some(RELATIVE_HUMIDITY)),
            ("precipitation", self.precipitation.as_ref(), Some(PRECIPITATION)),
            ("windSpeed", self.wind_speed.as_ref(), Some(WIND_SPEED)),
            ("windDirection", self.wind_direction.as_ref(), Some(WIND_DIRECTION)),
        ];
        if deltas.iter().all(|(_, delta, _)| delta.is_none()) {
            errors.push(ValidationError::new(
                "operations",
                "at least one weather variable must be modified",
            ));
        }
        for (property, delta, absolute) in deltas {
            if let Some(delta) = delta {
                delta.check(&mut errors, property, absolute);
            }
        }
        errors
    }
}

impl Encode for WeatherPatch {
    fn encode(&self, out: &mut RecordWriter) {
        let mut fields = Fields::new()
            .raw(&self.id)
            .opt_time(self.start_time.as_ref())
            .duration(&self.start_time_of_day)
            .opt_time(self.end_time.as_ref())
            .duration(&self.end_time_of_day);
        fields = match &self.source {
            Some(source) => source.wire_fields(fields),
            None => fields.null(),
        };
        fields = delta_fields(fields, self.temperature.as_ref());
        fields = delta_fields(fields, self.relative_humidity.as_ref());
        fields = delta_fields(fields, self.precipitation.as_ref());
        fields = delta_fields(fields, self.wind_speed.as_ref());
        fields = delta_fields(fields, self.wind_direction.as_ref());
        out.record(keywords::WEATHER_PATCH, fields.text(&self.comments));
    }
}

///////////////////////////////////////////////// Grids //////////////////////////////////////////////////

/// The variable a weather grid supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherGridType {
    /// Wind direction in degrees.
    WindDirection,
    /// Wind speed in km/h.
    WindSpeed,
}

impl WeatherGridType {
    fn wire_value(self) -> i64 {
        match self {
            WeatherGridType::WindDirection => 0,
            WeatherGridType::WindSpeed => 1,
        }
    }
}

/// The wind direction a grid file applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindSector {
    /// North.
    North,
    /// Northeast.
    Northeast,
    /// East.
    East,
    /// Southeast.
    Southeast,
    /// South.
    South,
    /// Southwest.
    Southwest,
    /// West.
    West,
    /// Northwest.
    Northwest,
}

impl WindSector {
    fn wire_value(self) -> i64 {
        self as i64
    }
}

/// One file of a weather grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherGridFile {
    /// The grid file.
    pub filename: String,
    /// Its projection file.
    pub projection: String,
    /// The wind sector the file applies to.
    #[serde(default)]
    pub sector: Option<WindSector>,
}

impl WeatherGridFile {
    /// A grid file with no sector.
    pub fn new(filename: &str, projection: &str) -> Self {
        Self {
            filename: filename.to_string(),
            projection: projection.to_string(),
            sector: None,
        }
    }
}

impl Validate for WeatherGridFile {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_file(&mut errors, ctx, "filename", &self.filename);
        check_file(&mut errors, ctx, "projection", &self.projection);
        errors
    }
}

/// Gridded wind speed or direction for a window of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherGrid {
    #[serde(deserialize_with = "deserialize_sanitized")]
    id: String,
    /// When the grid starts to apply.
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    /// When the grid stops applying.
    #[serde(default)]
    pub end_time: Option<DateTime<FixedOffset>>,
    /// Daily start, as an offset from midnight.
    #[serde(default)]
    pub start_time_of_day: WiseDuration,
    /// Daily end, as an offset from midnight.
    #[serde(default)]
    pub end_time_of_day: WiseDuration,
    /// Which variable the grid supplies.
    pub grid_type: WeatherGridType,
    /// Value used where the grid has no data.
    #[serde(default)]
    pub default_value: Option<f64>,
    /// The grid files.
    #[serde(default)]
    pub files: Vec<WeatherGridFile>,
    /// Free text.
    #[serde(default)]
    pub comments: String,
}

impl_identified!(WeatherGrid);

impl WeatherGrid {
    pub(crate) fn new(id: String, grid_type: WeatherGridType) -> Self {
        Self {
            id,
            start_time: None,
            end_time: None,
            start_time_of_day: WiseDuration::zero(),
            end_time_of_day: WiseDuration::from_hours(23).with_minutes(59).with_seconds(59.0),
            grid_type,
            default_value: None,
            files: Vec::new(),
            comments: String::new(),
        }
    }

    /// Adds a grid file, optionally tied to a wind sector.
    pub fn add_file(&mut self, filename: &str, projection: &str, sector: Option<WindSector>) {
        self.files.push(WeatherGridFile {
            filename: filename.to_string(),
            projection: projection.to_string(),
            sector,
        });
    }
}

impl Validate for WeatherGrid {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_time_window(&mut errors, self.start_time.as_ref(), self.end_time.as_ref());
        check_time_of_day(&mut errors, "startTimeOfDay", &self.start_time_of_day);
        check_time_of_day(&mut errors, "endTimeOfDay", &self.end_time_of_day);
        let default_range = match self.grid_type {
            WeatherGridType::WindDirection => WIND_DIRECTION,
            WeatherGridType::WindSpeed => WIND_SPEED,
        };
        check_optional_range(&mut errors, "defaultValue", self.default_value, default_range);
        if self.files.is_empty() {
            errors.push(ValidationError::new("files", "at least one grid file is required"));
        }
        let mut file_errors = Vec::new();
        for (index, file) in self.files.iter().enumerate() {
            let mut errs = file.check_valid(ctx);
            if self.files.len() > 1 && file.sector.is_none() {
                errs.push(ValidationError::new(
                    "sector",
                    "is required when more than one grid file is given",
                ));
            }
            if !errs.is_empty() {
                file_errors.push(ValidationError::parent(
                    index.to_string(),
                    format!("entry {} is invalid", index),
                    errs,
                ));
            }
        }
        nest(&mut errors, "files", file_errors);
        errors
    }
}

impl Encode for WeatherGrid {
    fn encode(&self, out: &mut RecordWriter) {
        let mut fields = Fields::new()
            .raw(&self.id)
            .opt_time(self.start_time.as_ref())
            .duration(&self.start_time_of_day)
            .opt_time(self.end_time.as_ref())
            .duration(&self.end_time_of_day)
            .int(self.grid_type.wire_value())
            .opt_num(self.default_value)
            .int(self.files.len() as i64);
        for file in &self.files {
            fields = fields
                .text(&file.filename)
                .text(&file.projection)
                .opt_int(file.sector.map(WindSector::wire_value));
        }
        out.record(keywords::WEATHER_GRID, fields.text(&self.comments));
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ctx() -> ValidationContext {
        ValidationContext::without_file_checks()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::west_opt(6 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 7, 1, hour, 0, 0)
            .unwrap()
    }

    fn stream() -> WeatherStream {
        WeatherStream::new(
            "wthrstrm0".to_string(),
            "attachment:/0/weather.txt",
            date(2024, 7, 1),
            date(2024, 7, 3),
        )
    }

    #[test]
    fn default_stream_is_valid() {
        assert!(stream().is_valid(&ctx()));
    }

    #[test]
    fn stream_ranges() {
        let mut s = stream();
        s.starting_ffmc = 101.5;
        s.starting_dc = -1.0;
        s.hffmc_hour = 24;
        let errors = s.check_valid(&ctx());
        let names: Vec<_> = errors.iter().map(|e| e.property_name.as_str()).collect();
        assert_eq!(names, vec!["hffmcHour", "startingFfmc", "startingDc"]);
    }

    #[test]
    fn stream_dates_may_be_equal_but_not_reversed() {
        let mut s = stream();
        s.end_date = s.start_date;
        assert!(s.is_valid(&ctx()));
        s.end_date = date(2024, 6, 30);
        let errors = s.check_valid(&ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property_name, "endDate");
    }

    #[test]
    fn stream_is_written_under_its_station() {
        let mut station = WeatherStation::new("wthrstn0".to_string(), LatLon::new(51.0, -115.0));
        station.streams.push(stream());
        let mut out = RecordWriter::new();
        station.encode(&mut out);
        let message = out.finish();
        assert_eq!(message.keywords(), vec!["weatherstation", "weatherstream"]);
        assert_eq!(message.data_for("weatherstation")[0], "wthrstn0|51|-115|null|");
        assert!(message.data_for("weatherstream")[0].starts_with("wthrstn0|wthrstrm0|"));
    }

    #[test]
    fn duplicate_stream_ids_nest_under_station() {
        let mut station = WeatherStation::new("wthrstn0".to_string(), LatLon::new(51.0, -115.0));
        station.streams.push(stream());
        let mut second = stream();
        second.set_name("WTHRSTRM0");
        station.streams.push(second);
        let errors = station.check_valid(&ctx());
        assert_eq!(errors[0].property_name, "streams");
        assert_eq!(errors[0].children[0].property_name, "1");
    }

    #[test]
    fn patch_needs_an_operation_and_a_source() {
        let mut patch = WeatherPatch::new("wthrptch0".to_string());
        patch.start_time = Some(time(10));
        patch.end_time = Some(time(16));
        let names: Vec<_> = patch
            .check_valid(&ctx())
            .into_iter()
            .map(|e| e.property_name)
            .collect();
        assert_eq!(names, vec!["source", "operations"]);

        patch.source = Some(PatchSource::Landscape);
        patch.relative_humidity = Some(PatchDelta::new(PatchOperation::Equal, 45.0));
        assert!(patch.is_valid(&ctx()));
    }

    #[test]
    fn patch_absolute_values_and_division() {
        let mut patch = WeatherPatch::new("wthrptch0".to_string());
        patch.start_time = Some(time(10));
        patch.end_time = Some(time(16));
        patch.source = Some(PatchSource::Landscape);
        patch.wind_direction = Some(PatchDelta::new(PatchOperation::Equal, 360.0));
        patch.temperature = Some(PatchDelta::new(PatchOperation::Divide, 0.0));
        let names: Vec<_> = patch
            .check_valid(&ctx())
            .into_iter()
            .map(|e| e.property_name)
            .collect();
        assert_eq!(names, vec!["temperature", "windDirection"]);
    }

    #[test]
    fn patch_window_must_be_ordered() {
        let mut patch = WeatherPatch::new("wthrptch0".to_string());
        patch.start_time = Some(time(16));
        patch.end_time = Some(time(16));
        patch.source = Some(PatchSource::Landscape);
        patch.wind_speed = Some(PatchDelta::new(PatchOperation::Plus, 5.0));
        let errors = patch.check_valid(&ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property_name, "endTime");
    }

    #[test]
    fn patch_wire_layout() {
        let mut patch = WeatherPatch::new("wthrptch0".to_string());
        patch.start_time = Some(time(10));
        patch.end_time = Some(time(16));
        patch.source = Some(PatchSource::Landscape);
        patch.wind_speed = Some(PatchDelta::new(PatchOperation::Multiply, 1.5));
        let mut out = RecordWriter::new();
        patch.encode(&mut out);
        let message = out.finish();
        assert_eq!(
            message.data_for("weatherpatch")[0],
            "wthrptch0|2024-07-01T10:00:00-06:00|PT0S|2024-07-01T16:00:00-06:00|PT23H59M59S|\
             landscape|null|null|null|null|null|null|3|1.5|null|null|"
        );
    }

    #[test]
    fn grid_needs_sectors_for_several_files() {
        let mut grid = WeatherGrid::new("wthrgrd0".to_string(), WeatherGridType::WindDirection);
        grid.start_time = Some(time(10));
        grid.end_time = Some(time(16));
        let errors = grid.check_valid(&ctx());
        assert_eq!(errors[0].property_name, "files");

        grid.add_file("attachment:/0/n.asc", "attachment:/1/n.prj", None);
        assert!(grid.is_valid(&ctx()));

        grid.add_file("attachment:/2/s.asc", "attachment:/1/n.prj", Some(WindSector::South));
        let errors = grid.check_valid(&ctx());
        assert_eq!(errors.len(), 1);
        let entry = &errors[0].children[0];
        assert_eq!(entry.property_name, "0");
        assert_eq!(entry.children[0].property_name, "sector");
    }

    #[test]
    fn grid_default_value_depends_on_type() {
        let mut grid = WeatherGrid::new("wthrgrd0".to_string(), WeatherGridType::WindSpeed);
        grid.start_time = Some(time(10));
        grid.end_time = Some(time(16));
        grid.add_file("attachment:/0/ws.asc", "attachment:/1/ws.prj", None);
        grid.default_value = Some(300.0);
        assert!(!grid.is_valid(&ctx()));
        grid.default_value = Some(200.0);
        assert!(grid.is_valid(&ctx()));
    }
}
