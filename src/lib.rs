//! # wise-builder: Building and Submitting Wildfire Growth Jobs
//!
//! A WISE job describes one run of a wildfire growth simulation: the landscape, the weather,
//! where fires start, the scenarios to simulate and the outputs to produce.  The simulation
//! itself runs in a separate backend; this crate builds the job, checks it, encodes it for the
//! backend's line protocol and submits it over TCP.
//!
//! This crate provides:
//!
//! - **Entity model**: weather stations and streams, weather patches and grids, fuel breaks and
//!   patches, grid files, ignitions, assets, targets, scenarios and output descriptors, each
//!   with a sanitized id handed out by the owning [`Job`]
//! - **Validation**: every entity returns a [`ValidationError`] tree so a caller can render
//!   `scenarios[2].fgmOptions.distRes` without parsing strings
//! - **Graph checks**: the [`Job`] adds cardinality rules and resolves the ids scenarios and
//!   outputs refer to
//! - **Codec**: a pure encoder from a job to an in-memory [`WireMessage`]
//! - **Transport**: a single-flight [`Session`] that runs the submission handshake and the
//!   ancillary lookups, returning a [`JobHandle`]
//!
//! ## Core Concepts
//!
//! ### Ids
//! Each entity gets a default id such as `wthrstn0` or `scen3` from its job's [`IdGenerator`].
//! Ids may be renamed; `|` is stripped because it delimits wire fields.  Scenarios and outputs
//! refer to other entities by id.
//!
//! ### Validation
//! Nothing validates on assignment.  [`Validate::check_valid`] walks the whole structure and
//! returns every problem; an empty list means valid.  File references are checked against the
//! local filesystem unless the [`ValidationContext`] says otherwise, and attachment names
//! always pass.
//!
//! ### Wire format
//! A job is a sequence of records: a keyword line followed by one `|`-delimited data line.
//! Attachments are framed between `file_attachment` and `file_attachment_end`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ CLI (wisectl, commands)                 │
//! ├─────────────────────────────────────────┤
//! │ Transport (Session, LookupRequest)      │
//! ├─────────────────────────────────────────┤
//! │ Codec (RecordWriter, WireMessage)       │
//! ├─────────────────────────────────────────┤
//! │ Job assembler (factories, graph rules)  │
//! ├─────────────────────────────────────────┤
//! │ Entities and validation                 │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage Examples
//!
//! ### Validating a job
//!
//! ```rust
//! use wise_builder::{Job, Validate, ValidationContext, leaf_errors};
//!
//! let job = Job::new();
//! let errors = job.check_valid(&ValidationContext::without_file_checks());
//! let paths: Vec<String> = leaf_errors(&errors).into_iter().map(|l| l.path).collect();
//! assert!(paths.contains(&"weatherStations".to_string()));
//! assert!(paths.contains(&"scenarios".to_string()));
//! ```
//!
//! ### Durations
//!
//! ```rust
//! use wise_builder::WiseDuration;
//!
//! let interval: WiseDuration = "PT1H30M".parse().unwrap();
//! assert_eq!(interval.total_seconds(), 5400.0);
//! assert_eq!(interval.to_string(), "PT1H30M");
//! ```
//!
//! ### Submitting
//!
//! ```rust,no_run
//! use wise_builder::{Job, ServerConfig, Session, ValidationContext};
//!
//! # async fn submit(job: Job) -> Result<(), wise_builder::SessionError> {
//! let session = Session::new(ServerConfig::from_env().unwrap_or_default());
//! let handle = session.submit_job(&job, &ValidationContext::default()).await?;
//! println!("queued as {}", handle);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

mod asset;
mod attachment;
mod codec;
mod duration;
mod errors;
mod fuel;
mod geometry;
mod handle;
mod ids;
mod ignition;
mod job;
mod outputs;
mod timezone;
mod validation;
mod weather;

/// Scenarios, their option blocks and the references they hold.
pub mod scenario;

/// TCP transport: server configuration, sessions and lookups.
pub mod transport;

/// Client configuration loaded from JSON or YAML files.
pub mod config;

/// Logging setup for binaries.
pub mod logging;

// CLI utility modules

/// Command-line interface utilities for program termination and output formatting.
///
/// This module provides common CLI utilities for the wisectl binary, including
/// error handling, formatted output, and program termination functions.
pub mod cli_utils;

/// Command-line interface command handlers.
///
/// This module contains organized command handlers for the wisectl CLI application,
/// with each command type implemented in a dedicated submodule.
pub mod commands;

pub use asset::{AssetFile, TargetFile};
pub use attachment::{
    ATTACHMENT_PREFIX, AttachmentContents, FileAttachment, is_attachment_name, is_safe_filename,
};
pub use codec::{Encode, Fields, Record, RecordWriter, WireMessage, keywords, trim_response};
pub use config::ClientConfig;
pub use duration::WiseDuration;
pub use errors::{AttachmentError, ConfigError, DurationParseError, JobError, SessionError};
pub use fuel::{
    FromFuel, FromFuelRule, FuelBreak, FuelOption, FuelOptionType, FuelPatch, GridFile,
    GridFileType,
};
pub use geometry::{LatLon, PatchSource, Shape, ShapeKind};
pub use handle::JobHandle;
pub use ids::{EntityKind, IdGenerator, Identified, sanitize_name};
pub use ignition::Ignition;
pub use job::{InputFiles, Job, JobOptions};
pub use outputs::{
    AssetStatsExport, ExportUnits, FuelGridExport, GlobalStatistic, GridCompression,
    GridInterpolation, GridOutput, OutputStream, Outputs, ScenarioOutput, StatsFile,
    StatsFileType, SummaryFile, TimestepSettings, Unit, UnitCategory, VectorFile,
    VectorMetadata,
};
pub use scenario::{
    AssetOperation, AssetReference, BurningCondition, FbpOptions, FgmOptions, FmcOptions,
    FwiOptions, IgnitionReference, KnownIds, LayerRef, OptionMode, Scenario, StationStreamRef,
    TargetReference,
};
pub use timezone::Timezone;
pub use transport::{JobListKind, LookupRequest, ServerConfig, Session, SessionState};
pub use validation::{
    LeafError, Range, Validate, ValidationContext, ValidationError, leaf_errors,
};
pub use weather::{
    DiurnalParameters, HffmcMethod, PatchDelta, PatchOperation, WeatherGrid, WeatherGridFile,
    WeatherGridType, WeatherPatch, WeatherStation, WeatherStream, WindSector,
};
