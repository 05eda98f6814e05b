//! # Command Handlers
//!
//! This module contains organized command handlers for the wisectl CLI application.
//! Each command type is implemented in a dedicated submodule.
//!
//! ## Structure
//!
//! - `job` - Job commands (validate, encode, submit)
//! - `lookup` - Backend queries (timezones, cities, weather, jobs, delete, stop, tar, zip)
//! - `shared` - Shared context, argument parsing and dispatch
//! - `errors` / `error_extensions` - `UserError` and its `handled` conversions

pub mod error_extensions;
pub mod errors;
pub mod job;
pub mod lookup;
pub mod shared;

pub use job::handle_job_command;
pub use lookup::handle_lookup_command;
pub use shared::CommandContext;
