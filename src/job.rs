//! # Jobs
//!
//! A [`Job`] owns every entity of one submission.  Entities are created through its factory
//! methods, which hand out default ids from the job's own [`IdGenerator`], and are then mutated
//! freely.  [`Job::check_valid`](Validate::check_valid) validates the whole graph, including
//! whether the ids a scenario references exist; [`Job::begin_job`] validates and then encodes.
//!
//! ```rust
//! use chrono::{FixedOffset, NaiveDate, TimeZone};
//! use wise_builder::{Identified, Job, LatLon, Shape, Validate, ValidationContext};
//!
//! let tz = FixedOffset::west_opt(6 * 3600).unwrap();
//! let start = tz.with_ymd_and_hms(2024, 7, 1, 13, 0, 0).unwrap();
//! let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
//!
//! let mut job = Job::new();
//! job.inputs.projection = "attachment:/0/fuel.prj".to_string();
//! job.inputs.lut = "attachment:/1/fuel.lut".to_string();
//! job.inputs.fuelmap = "attachment:/2/fuel.asc".to_string();
//! let station = job.add_weather_station(LatLon::new(51.65, -115.36)).id().to_string();
//! let stream = job
//!     .add_weather_stream(&station, "attachment:/3/weather.txt", day, day)
//!     .unwrap()
//!     .id()
//!     .to_string();
//! let ignition = job
//!     .add_ignition(start, Shape::point(LatLon::new(51.66, -115.35)))
//!     .id()
//!     .to_string();
//! let scenario = job.add_scenario();
//! scenario.start_time = Some(start);
//! scenario.end_time = Some(start + chrono::Duration::hours(8));
//! scenario.add_stream_ref(&station, &stream);
//! scenario.add_ignition_ref(&ignition);
//!
//! assert!(job.is_valid(&ValidationContext::default()));
//! ```

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::asset::{AssetFile, TargetFile};
use crate::attachment::{AttachmentContents, FileAttachment};
use crate::codec::{Encode, Fields, RecordWriter, WireMessage, keywords};
use crate::errors::JobError;
use crate::fuel::{FuelBreak, FuelOption, FuelOptionType, FuelPatch, GridFile, GridFileType};
use crate::geometry::{LatLon, Shape};
use crate::ids::{EntityKind, IdGenerator, Identified};
use crate::ignition::Ignition;
use crate::outputs::{GlobalStatistic, GridOutput, Outputs, StatsFile, SummaryFile, VectorFile};
use crate::scenario::{KnownIds, Scenario};
use crate::timezone::Timezone;
use crate::validation::{
    Range, Validate, ValidationContext, ValidationError, check_file, check_optional_file,
    check_range, leaf_errors, nest, validate_collection, validate_entries, validate_list,
};
use crate::weather::{WeatherGrid, WeatherGridType, WeatherPatch, WeatherStation, WeatherStream};

const PRIORITY: Range = Range::closed(0.0, 10.0);

////////////////////////////////////////////// Input files ///////////////////////////////////////////////

/// The landscape and the layers that modify it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputFiles {
    /// Projection of the landscape.
    pub projection: String,
    /// Fuel lookup table.
    pub lut: String,
    /// Fuel map grid.
    pub fuelmap: String,
    /// Elevation grid.
    pub elevation: Option<String>,
    /// Fuel breaks.
    pub fuel_breaks: Vec<FuelBreak>,
    /// Fuel patches.
    pub fuel_patches: Vec<FuelPatch>,
    /// Weather grids.
    pub weather_grids: Vec<WeatherGrid>,
    /// Weather patches.
    pub weather_patches: Vec<WeatherPatch>,
    /// Input grid files.
    pub grid_files: Vec<GridFile>,
}

impl Validate for InputFiles {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_file(&mut errors, ctx, "projection", &self.projection);
        check_file(&mut errors, ctx, "lutFile", &self.lut);
        check_file(&mut errors, ctx, "fuelmapFile", &self.fuelmap);
        check_optional_file(&mut errors, ctx, "elevationFile", self.elevation.as_deref());
        let fuel_breaks = validate_collection(&self.fuel_breaks, ctx, |_, _| Vec::new());
        nest(&mut errors, "fuelBreaks", fuel_breaks);
        let fuel_patches = validate_collection(&self.fuel_patches, ctx, |_, _| Vec::new());
        nest(&mut errors, "fuelPatches", fuel_patches);
        let weather_grids = validate_collection(&self.weather_grids, ctx, |_, _| Vec::new());
        nest(&mut errors, "weatherGrids", weather_grids);
        let weather_patches = validate_collection(&self.weather_patches, ctx, |_, _| Vec::new());
        nest(&mut errors, "weatherPatches", weather_patches);
        let grid_files = validate_collection(&self.grid_files, ctx, |_, _| Vec::new());
        nest(&mut errors, "gridFiles", grid_files);
        errors
    }
}

impl Encode for InputFiles {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(keywords::PROJECTION_FILE, Fields::new().text(&self.projection));
        out.record(keywords::LUT_FILE, Fields::new().text(&self.lut));
        out.record(keywords::FUELMAP_FILE, Fields::new().text(&self.fuelmap));
        if let Some(elevation) = &self.elevation {
            out.record(keywords::ELEVATION_FILE, Fields::new().text(elevation));
        }
        self.fuel_breaks.encode(out);
        self.fuel_patches.encode(out);
        self.weather_grids.encode(out);
        self.weather_patches.encode(out);
        self.grid_files.encode(out);
    }
}

////////////////////////////////////////////// Job options ///////////////////////////////////////////////

/// How the backend schedules and checks the job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobOptions {
    /// Queue priority, 0 (lowest) to 10.
    pub priority: i32,
    /// Have the backend validate the job instead of running it.
    pub validate: bool,
    /// Split scenarios across backend workers.
    pub load_balance: bool,
}

impl Validate for JobOptions {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_range(&mut errors, "priority", self.priority.into(), PRIORITY);
        errors
    }
}

impl Encode for JobOptions {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::JOB_OPTIONS,
            Fields::new()
                .int(self.priority.into())
                .flag(self.validate)
                .flag(self.load_balance),
        );
    }
}

////////////////////////////////////////////////// Job ///////////////////////////////////////////////////

/// One submission: inputs, weather, ignitions, scenarios and requested outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    #[serde(skip)]
    ids: IdGenerator,
    /// Free text sent ahead of everything else.
    pub comments: String,
    attachments: Vec<FileAttachment>,
    /// Landscape inputs and layers.
    pub inputs: InputFiles,
    /// Weather stations and their streams.
    pub weather_stations: Vec<WeatherStation>,
    /// Ignitions.
    pub ignitions: Vec<Ignition>,
    /// Scenarios.
    pub scenarios: Vec<Scenario>,
    /// Fuel type overrides.
    pub fuel_options: Vec<FuelOption>,
    /// Assets.
    pub assets: Vec<AssetFile>,
    /// Targets.
    pub targets: Vec<TargetFile>,
    /// Timezone of local times.
    pub timezone: Timezone,
    /// Requested outputs.
    pub outputs: Outputs,
    /// Scheduling options.
    pub job_options: JobOptions,
}

impl Job {
    /// An empty job.
    pub fn new() -> Self {
        Self::default()
    }

    fn id_in_use(&self, id: &str) -> bool {
        let inputs = &self.inputs;
        self.weather_stations
            .iter()
            .any(|s| s.id() == id || s.streams.iter().any(|st| st.id() == id))
            || inputs.fuel_breaks.iter().any(|e| e.id() == id)
            || inputs.fuel_patches.iter().any(|e| e.id() == id)
            || inputs.weather_grids.iter().any(|e| e.id() == id)
            || inputs.weather_patches.iter().any(|e| e.id() == id)
            || inputs.grid_files.iter().any(|e| e.id() == id)
            || self.ignitions.iter().any(|e| e.id() == id)
            || self.assets.iter().any(|e| e.id() == id)
            || self.targets.iter().any(|e| e.id() == id)
            || self.scenarios.iter().any(|e| e.id() == id)
    }

    /// The next default id for `kind` that no entity in the job already uses.
    fn fresh_id(&mut self, kind: EntityKind) -> String {
        loop {
            let id = self.ids.next_id(kind);
            if !self.id_in_use(&id) {
                return id;
            }
        }
    }

    //////////////////////////////////////////// Factories ////////////////////////////////////////////

    /// Adds a weather station at `location`.
    pub fn add_weather_station(&mut self, location: LatLon) -> &mut WeatherStation {
        let id = self.fresh_id(EntityKind::WeatherStation);
        self.weather_stations.push(WeatherStation::new(id, location));
        let last = self.weather_stations.len() - 1;
        &mut self.weather_stations[last]
    }

    /// Adds a weather stream to the station with `station_id`.
    pub fn add_weather_stream(
        &mut self,
        station_id: &str,
        filename: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<&mut WeatherStream, JobError> {
        let Some(index) = self.weather_stations.iter().position(|s| s.id() == station_id) else {
            return Err(JobError::UnknownWeatherStation(station_id.to_string()));
        };
        let id = self.fresh_id(EntityKind::WeatherStream);
        let station = &mut self.weather_stations[index];
        station
            .streams
            .push(WeatherStream::new(id, filename, start_date, end_date));
        let last = station.streams.len() - 1;
        Ok(&mut station.streams[last])
    }

    /// Adds an empty weather patch.
    pub fn add_weather_patch(&mut self) -> &mut WeatherPatch {
        let id = self.fresh_id(EntityKind::WeatherPatch);
        self.inputs.weather_patches.push(WeatherPatch::new(id));
        let last = self.inputs.weather_patches.len() - 1;
        &mut self.inputs.weather_patches[last]
    }

    /// Adds a weather grid with no files.
    pub fn add_weather_grid(&mut self, grid_type: WeatherGridType) -> &mut WeatherGrid {
        let id = self.fresh_id(EntityKind::WeatherGrid);
        self.inputs.weather_grids.push(WeatherGrid::new(id, grid_type));
        let last = self.inputs.weather_grids.len() - 1;
        &mut self.inputs.weather_grids[last]
    }

    /// Adds a fuel patch writing `to_fuel`.
    pub fn add_fuel_patch(&mut self, to_fuel: &str) -> &mut FuelPatch {
        let id = self.fresh_id(EntityKind::FuelPatch);
        self.inputs.fuel_patches.push(FuelPatch::new(id, to_fuel));
        let last = self.inputs.fuel_patches.len() - 1;
        &mut self.inputs.fuel_patches[last]
    }

    /// Adds a fuel break drawn as `shape`.
    pub fn add_fuel_break(&mut self, shape: Shape) -> &mut FuelBreak {
        let id = self.fresh_id(EntityKind::FuelBreak);
        self.inputs.fuel_breaks.push(FuelBreak::new(id, shape));
        let last = self.inputs.fuel_breaks.len() - 1;
        &mut self.inputs.fuel_breaks[last]
    }

    /// Adds an input grid file.
    pub fn add_grid_file(
        &mut self,
        file_type: GridFileType,
        filename: &str,
        projection: &str,
    ) -> &mut GridFile {
        let id = self.fresh_id(EntityKind::GridFile);
        self.inputs
            .grid_files
            .push(GridFile::new(id, file_type, filename, projection));
        let last = self.inputs.grid_files.len() - 1;
        &mut self.inputs.grid_files[last]
    }

    /// Adds an ignition starting at `start_time`.
    pub fn add_ignition(&mut self, start_time: DateTime<FixedOffset>, shape: Shape) -> &mut Ignition {
        let id = self.fresh_id(EntityKind::Ignition);
        self.ignitions.push(Ignition::new(id, Some(start_time), shape));
        let last = self.ignitions.len() - 1;
        &mut self.ignitions[last]
    }

    /// Adds an asset drawn as `shape`.
    pub fn add_asset(&mut self, shape: Shape) -> &mut AssetFile {
        let id = self.fresh_id(EntityKind::AssetFile);
        self.assets.push(AssetFile::new(id, shape));
        let last = self.assets.len() - 1;
        &mut self.assets[last]
    }

    /// Adds a target drawn as `shape`.
    pub fn add_target(&mut self, shape: Shape) -> &mut TargetFile {
        let id = self.fresh_id(EntityKind::TargetFile);
        self.targets.push(TargetFile::new(id, shape));
        let last = self.targets.len() - 1;
        &mut self.targets[last]
    }

    /// Adds a scenario with default options and no references.
    pub fn add_scenario(&mut self) -> &mut Scenario {
        let id = self.fresh_id(EntityKind::Scenario);
        self.scenarios.push(Scenario::new(id));
        let last = self.scenarios.len() - 1;
        &mut self.scenarios[last]
    }

    /// Overrides one attribute of a fuel type.
    pub fn add_fuel_option(&mut self, fuel_type: &str, option_type: FuelOptionType, value: f64) {
        self.fuel_options
            .push(FuelOption::new(fuel_type, option_type, value));
    }

    /// Carries `contents` inside the job, returning the name to use in place of a filename.
    pub fn add_attachment(
        &mut self,
        filename: &str,
        contents: AttachmentContents,
    ) -> Result<String, JobError> {
        let attachment = FileAttachment::new(self.attachments.len(), filename, contents)?;
        let name = attachment.name().to_string();
        debug!(name = %name, bytes = attachment.contents().len(), "added attachment");
        self.attachments.push(attachment);
        Ok(name)
    }

    /// Requests a summary of `scenario_id`.
    pub fn add_summary_file(&mut self, scenario_id: &str, filename: &str) -> &mut SummaryFile {
        let files = &mut self.outputs.summary_files;
        files.push(SummaryFile::new(scenario_id, filename));
        let last = files.len() - 1;
        &mut files[last]
    }

    /// Requests perimeters of `scenario_id`.
    pub fn add_vector_file(&mut self, scenario_id: &str, filename: &str) -> &mut VectorFile {
        let files = &mut self.outputs.vector_files;
        files.push(VectorFile::new(scenario_id, filename));
        let last = files.len() - 1;
        &mut files[last]
    }

    /// Requests a grid of `statistic` for `scenario_id`.
    pub fn add_grid_output(
        &mut self,
        scenario_id: &str,
        filename: &str,
        statistic: GlobalStatistic,
    ) -> &mut GridOutput {
        let files = &mut self.outputs.grid_files;
        files.push(GridOutput::new(scenario_id, filename, statistic));
        let last = files.len() - 1;
        &mut files[last]
    }

    /// Requests a statistics table for `scenario_id`.
    pub fn add_stats_file(
        &mut self,
        scenario_id: &str,
        filename: &str,
        columns: Vec<GlobalStatistic>,
    ) -> &mut StatsFile {
        let files = &mut self.outputs.stats_files;
        files.push(StatsFile::new(scenario_id, filename, columns));
        let last = files.len() - 1;
        &mut files[last]
    }

    ///////////////////////////////////////////// Lookups /////////////////////////////////////////////

    /// The attachments carried by the job, in registration order.
    pub fn attachments(&self) -> &[FileAttachment] {
        &self.attachments
    }

    /// The station with `id`.
    pub fn weather_station(&self, id: &str) -> Option<&WeatherStation> {
        self.weather_stations.iter().find(|s| s.id() == id)
    }

    /// Mutable access to the station with `id`.
    pub fn weather_station_mut(&mut self, id: &str) -> Option<&mut WeatherStation> {
        self.weather_stations.iter_mut().find(|s| s.id() == id)
    }

    /// The scenario with `id`.
    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id() == id)
    }

    /// Mutable access to the scenario with `id`.
    pub fn scenario_mut(&mut self, id: &str) -> Option<&mut Scenario> {
        self.scenarios.iter_mut().find(|s| s.id() == id)
    }

    /// Every id in the job, by kind, for resolving references.
    pub fn known_ids(&self) -> KnownIds<'_> {
        let inputs = &self.inputs;
        let mut layers: HashSet<&str> = HashSet::new();
        layers.extend(inputs.grid_files.iter().map(Identified::id));
        layers.extend(inputs.fuel_patches.iter().map(Identified::id));
        layers.extend(inputs.weather_patches.iter().map(Identified::id));
        layers.extend(inputs.weather_grids.iter().map(Identified::id));
        KnownIds {
            streams: self
                .weather_stations
                .iter()
                .flat_map(|station| station.streams.iter().map(move |s| (station.id(), s.id())))
                .collect(),
            fuel_breaks: inputs.fuel_breaks.iter().map(Identified::id).collect(),
            layers,
            ignitions: self.ignitions.iter().map(Identified::id).collect(),
            assets: self.assets.iter().map(Identified::id).collect(),
            targets: self.targets.iter().map(Identified::id).collect(),
            scenarios: self.scenarios.iter().map(Identified::id).collect(),
        }
    }

    ///////////////////////////////////////////// Encoding ////////////////////////////////////////////

    /// Renders the job as wire records without validating it.
    pub fn encode(&self) -> WireMessage {
        let mut out = RecordWriter::new();
        if !self.comments.is_empty() {
            out.record(keywords::GLOBAL_COMMENTS, Fields::new().text(&self.comments));
        }
        for attachment in &self.attachments {
            out.attachment(attachment.name(), attachment.contents());
        }
        self.inputs.encode(&mut out);
        self.weather_stations.encode(&mut out);
        self.ignitions.encode(&mut out);
        self.scenarios.encode(&mut out);
        self.fuel_options.encode(&mut out);
        self.assets.encode(&mut out);
        self.targets.encode(&mut out);
        self.timezone.encode(&mut out);
        self.outputs.encode(&mut out);
        self.job_options.encode(&mut out);
        out.finish()
    }

    /// Validates the job and, if it is valid, renders it for submission.
    pub fn begin_job(&self, ctx: &ValidationContext) -> Result<WireMessage, JobError> {
        let errors = self.check_valid(ctx);
        if !errors.is_empty() {
            for leaf in leaf_errors(&errors) {
                debug!(path = %leaf.path, message = %leaf.error.message, "validation error");
            }
            warn!(
                problems = errors.iter().map(ValidationError::leaf_count).sum::<usize>(),
                "job failed validation"
            );
            return Err(JobError::Invalid(errors));
        }
        let message = self.encode();
        info!(
            records = message.len(),
            scenarios = self.scenarios.len(),
            "job encoded"
        );
        Ok(message)
    }
}

impl Validate for Job {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let known = self.known_ids();
        let mut errors = Vec::new();

        nest(&mut errors, "inputs", self.inputs.check_valid(ctx));

        if self.weather_stations.is_empty() {
            errors.push(ValidationError::new(
                "weatherStations",
                "at least one weather station is required",
            ));
        } else {
            let stations = validate_collection(&self.weather_stations, ctx, |_, _| Vec::new());
            nest(&mut errors, "weatherStations", stations);
        }

        let ignitions = validate_collection(&self.ignitions, ctx, |_, _| Vec::new());
        nest(&mut errors, "ignitions", ignitions);

        if self.scenarios.is_empty() {
            errors.push(ValidationError::new(
                "scenarios",
                "at least one scenario is required",
            ));
        } else {
            let scenarios =
                validate_entries(&self.scenarios, |_, s| s.check_with(ctx, Some(&known)));
            nest(&mut errors, "scenarios", scenarios);
        }

        nest(&mut errors, "fuelOptions", validate_list(&self.fuel_options, ctx));
        let assets = validate_collection(&self.assets, ctx, |_, _| Vec::new());
        nest(&mut errors, "assets", assets);
        let targets = validate_collection(&self.targets, ctx, |_, _| Vec::new());
        nest(&mut errors, "targets", targets);
        nest(&mut errors, "timezone", self.timezone.check_valid(ctx));
        nest(&mut errors, "outputs", self.outputs.check_with(ctx, Some(&known)));
        nest(&mut errors, "jobOptions", self.job_options.check_valid(ctx));
        nest(&mut errors, "exportUnits", self.outputs.export_units.check_valid(ctx));
        errors
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::scenario::TargetReference;

    fn ctx() -> ValidationContext {
        ValidationContext::without_file_checks()
    }

    fn start() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(6 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 7, 1, 13, 0, 0)
            .unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn minimal() -> Job {
        let mut job = Job::new();
        job.inputs.projection = "fuel.prj".to_string();
        job.inputs.lut = "fuel.lut".to_string();
        job.inputs.fuelmap = "fuel.asc".to_string();
        let station = job.add_weather_station(LatLon::new(51.0, -115.0)).id().to_string();
        let stream = job
            .add_weather_stream(&station, "weather.txt", day(), day())
            .unwrap()
            .id()
            .to_string();
        let ignition = job
            .add_ignition(start(), Shape::point(LatLon::new(51.0, -115.0)))
            .id()
            .to_string();
        let scenario = job.add_scenario();
        scenario.start_time = Some(start());
        scenario.end_time = Some(start() + chrono::Duration::hours(6));
        scenario.add_stream_ref(&station, &stream);
        scenario.add_ignition_ref(&ignition);
        job
    }

    fn root_names(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.property_name.as_str()).collect()
    }

    #[test]
    fn factories_hand_out_prefixed_ids() {
        let job = minimal();
        assert_eq!(job.weather_stations[0].id(), "wthrstn0");
        assert_eq!(job.weather_stations[0].streams[0].id(), "wthrstrm0");
        assert_eq!(job.ignitions[0].id(), "ign0");
        assert_eq!(job.scenarios[0].id(), "scen0");
    }

    #[test]
    fn every_collection_has_its_own_counter() {
        let mut job = minimal();
        let area = Shape::polygon(vec![
            LatLon::new(51.0, -115.0),
            LatLon::new(51.1, -115.0),
            LatLon::new(51.1, -115.1),
        ]);
        assert_eq!(job.add_weather_patch().id(), "wthrptch0");
        assert_eq!(job.add_weather_grid(WeatherGridType::WindSpeed).id(), "wthrgrd0");
        assert_eq!(job.add_fuel_patch("D-1/D-2").id(), "fuelptch0");
        assert_eq!(job.add_fuel_break(area.clone()).id(), "fuelbrk0");
        assert_eq!(
            job.add_grid_file(GridFileType::FuelGrid, "fuel.tif", "fuel.prj").id(),
            "grdfl0"
        );
        assert_eq!(job.add_asset(area.clone()).id(), "asset0");
        assert_eq!(job.add_target(area).id(), "target0");
        assert_eq!(job.add_fuel_break(Shape::point(LatLon::new(51.0, -115.0))).id(), "fuelbrk1");

        job.add_fuel_option("O-1a", FuelOptionType::GrassCuring, 60.0);
        job.add_stats_file("scen0", "stats.csv", vec![GlobalStatistic::MaxFi]);
        assert_eq!(job.fuel_options.len(), 1);
        assert_eq!(job.outputs.stats_files.len(), 1);
    }

    #[test]
    fn delimiter_only_names_leave_the_job_invalid() {
        let mut job = minimal();
        job.add_fuel_break(Shape::point(LatLon::new(51.0, -115.0)))
            .set_name("|");
        let errors = job.check_valid(&ctx());
        let paths: Vec<String> = leaf_errors(&errors).into_iter().map(|l| l.path).collect();
        assert_eq!(paths, vec!["inputs.fuelBreaks[0].id"]);
        assert!(matches!(job.begin_job(&ctx()), Err(JobError::Invalid(_))));
    }

    #[test]
    fn lookups_find_entities_by_id() {
        let mut job = minimal();
        assert!(job.weather_station("wthrstn0").is_some());
        assert!(job.weather_station("wthrstn1").is_none());
        job.weather_station_mut("wthrstn0").unwrap().set_name("Banff");
        assert_eq!(job.weather_stations[0].id(), "Banff");

        job.add_asset(Shape::point(LatLon::new(51.0, -115.0)));
        job.scenario_mut("scen0").unwrap().add_asset_ref("asset0");
        assert_eq!(job.scenarios[0].asset_refs.len(), 1);
        assert!(job.scenario_mut("scen9").is_none());
    }

    #[test]
    fn two_jobs_count_independently() {
        let a = minimal();
        let b = minimal();
        assert_eq!(a.scenarios[0].id(), b.scenarios[0].id());
    }

    #[test]
    fn stream_needs_an_existing_station() {
        let mut job = Job::new();
        let err = job
            .add_weather_stream("wthrstn7", "weather.txt", day(), day())
            .unwrap_err();
        assert!(matches!(err, JobError::UnknownWeatherStation(id) if id == "wthrstn7"));
    }

    #[test]
    fn renamed_entity_does_not_collide_with_later_defaults() {
        let mut job = Job::new();
        job.add_scenario().set_name("scen1");
        let second = job.add_scenario().id().to_string();
        assert_eq!(second, "scen2");
    }

    #[test]
    fn minimal_job_is_valid() {
        assert!(minimal().is_valid(&ctx()));
    }

    #[test]
    fn empty_job_reports_cardinality_and_inputs() {
        let errors = Job::new().check_valid(&ctx());
        assert_eq!(root_names(&errors), vec!["inputs", "weatherStations", "scenarios"]);
    }

    #[test]
    fn duplicate_scenario_id_is_reported_at_the_later_index() {
        let mut job = minimal();
        let mut copy = job.scenarios[0].clone();
        copy.set_name("SCEN0");
        job.scenarios.push(copy);
        let errors = job.check_valid(&ctx());
        assert_eq!(root_names(&errors), vec!["scenarios"]);
        let entries = &errors[0].children;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].property_name, "1");
        assert_eq!(entries[0].children[0].property_name, "id");
    }

    #[test]
    fn unknown_ignition_is_nested_under_its_scenario() {
        let mut job = minimal();
        job.scenarios[0].add_ignition_ref("ign42");
        job.scenarios[0].wind_target = Some(TargetReference::new("target0"));
        let errors = job.check_valid(&ctx());
        let paths: Vec<String> = leaf_errors(&errors).iter().map(|l| l.path.clone()).collect();
        assert_eq!(
            paths,
            vec!["scenarios[0].ignitionRefs[1].id", "scenarios[0].windTarget.id"]
        );
    }

    #[test]
    fn outputs_must_name_a_scenario_in_the_job() {
        let mut job = minimal();
        job.add_vector_file("scen5", "perimeters.kml");
        let errors = job.check_valid(&ctx());
        assert_eq!(root_names(&errors), vec!["outputs"]);
    }

    #[test]
    fn attachments_are_numbered_in_order() {
        let mut job = Job::new();
        let first = job
            .add_attachment("fuel.prj", AttachmentContents::Text("PROJCS".to_string()))
            .unwrap();
        let second = job
            .add_attachment("fuel.asc", AttachmentContents::Binary(vec![1, 2, 3]))
            .unwrap();
        assert_eq!(first, "attachment:/0/fuel.prj");
        assert_eq!(second, "attachment:/1/fuel.asc");
        assert!(job.add_attachment("con", AttachmentContents::Text(String::new())).is_err());
        assert_eq!(job.attachments().len(), 2);
    }

    #[test]
    fn begin_job_refuses_invalid_graphs() {
        let err = Job::new().begin_job(&ctx()).unwrap_err();
        match err {
            JobError::Invalid(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn emission_order_of_sections() {
        let mut job = minimal();
        job.comments = "test run".to_string();
        job.add_attachment("notes.txt", AttachmentContents::Text("hi".to_string()))
            .unwrap();
        job.add_summary_file("scen0", "summary.txt");
        let message = job.begin_job(&ctx()).unwrap();
        let keywords = message.keywords();
        assert_eq!(&keywords[..5], &[
            "global_comments",
            "file_attachment",
            "projfile",
            "lutfile",
            "fuelmapfile"
        ]);
        assert!(!message.contains_keyword("elevationfile"));
        let position = |k: &str| keywords.iter().position(|x| *x == k).unwrap();
        assert!(position("weatherstation") < position("ignition"));
        assert!(position("scenarioend") < position("timezone"));
        assert!(position("timezone") < position("summaryfile"));
        assert_eq!(keywords.last(), Some(&"job_options"));
    }
}
