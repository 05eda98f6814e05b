//! # Transport
//!
//! Talking to the backend over TCP.  [`ServerConfig`] says where it is, [`Session`] runs one
//! request at a time, and [`LookupRequest`] covers the single-line queries.

pub mod config;
pub mod lookup;
pub mod session;

pub use config::ServerConfig;
pub use lookup::{JobListKind, LookupRequest};
pub use session::{Session, SessionState};
