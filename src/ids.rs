//! # Entity Identifiers
//!
//! Every referenceable entity in a job carries a string id.  Fresh entities receive a default id
//! made of a per-kind prefix and a per-kind counter (`wthrstn0`, `wthrstn1`, `scen0`, ...).  The
//! counters live in an [`IdGenerator`] owned by the job, so two jobs built in the same process
//! hand out the same sequence of ids.
//!
//! Ids are embedded verbatim in the `|`-delimited, newline-terminated wire format, so every
//! user-supplied name is passed through [`sanitize_name`] before it is stored.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Deserializer, Serialize};

/// The delimiter used between fields of a wire record.
pub const FIELD_DELIMITER: char = '|';

/////////////////////////////////////////////// EntityKind ///////////////////////////////////////////////

/// The kinds of entity that receive generated ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A weather station.
    WeatherStation,
    /// A weather stream attached to a station.
    WeatherStream,
    /// A weather patch.
    WeatherPatch,
    /// A gridded weather input.
    WeatherGrid,
    /// A fuel patch.
    FuelPatch,
    /// A fuel break.
    FuelBreak,
    /// An input grid file.
    GridFile,
    /// An ignition.
    Ignition,
    /// An asset file.
    AssetFile,
    /// A target file.
    TargetFile,
    /// A scenario.
    Scenario,
}

impl EntityKind {
    /// The prefix used for generated ids of this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::WeatherStation => "wthrstn",
            EntityKind::WeatherStream => "wthrstrm",
            EntityKind::WeatherPatch => "wthrptch",
            EntityKind::WeatherGrid => "wthrgrd",
            EntityKind::FuelPatch => "fuelptch",
            EntityKind::FuelBreak => "fuelbrk",
            EntityKind::GridFile => "grdfl",
            EntityKind::Ignition => "ign",
            EntityKind::AssetFile => "asset",
            EntityKind::TargetFile => "target",
            EntityKind::Scenario => "scen",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.prefix())
    }
}

////////////////////////////////////////////// IdGenerator ///////////////////////////////////////////////

/// Hands out default ids, one monotonically increasing counter per [`EntityKind`].
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    counters: HashMap<EntityKind, u32>,
}

impl IdGenerator {
    /// Creates a generator whose counters all start at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id for `kind` and advances that kind's counter.
    pub fn next_id(&mut self, kind: EntityKind) -> String {
        let counter = self.counters.entry(kind).or_insert(0);
        let id = format!("{}{}", kind.prefix(), counter);
        *counter += 1;
        id
    }

    /// How many ids of `kind` have been handed out.
    pub fn issued(&self, kind: EntityKind) -> u32 {
        self.counters.get(&kind).copied().unwrap_or(0)
    }
}

/////////////////////////////////////////////// Sanitizing ///////////////////////////////////////////////

/// Removes every field delimiter and line break from `name`.
///
/// Sanitizing is idempotent: a sanitized name passes through unchanged.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(*c, FIELD_DELIMITER | '\n' | '\r'))
        .collect()
}

/// Serde helper that sanitizes ids as they are read from a job description.
pub fn deserialize_sanitized<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(sanitize_name(&raw))
}

////////////////////////////////////////////// Identified ////////////////////////////////////////////////

/// An entity that owns an id other entities may reference.
pub trait Identified {
    /// The entity's current id.
    fn id(&self) -> &str;

    /// Replaces the id with `name`, stripped of field delimiters.
    fn set_name(&mut self, name: &str);
}

/// Implements [`Identified`] for structs that keep their id in a private `id: String` field.
macro_rules! impl_identified {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::ids::Identified for $ty {
                fn id(&self) -> &str {
                    &self.id
                }

                fn set_name(&mut self, name: &str) {
                    self.id = $crate::ids::sanitize_name(name);
                }
            }
        )*
    };
}

pub(crate) use impl_identified;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_counts_per_kind() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_id(EntityKind::WeatherStation), "wthrstn0");
        assert_eq!(ids.next_id(EntityKind::WeatherStation), "wthrstn1");
        assert_eq!(ids.next_id(EntityKind::Scenario), "scen0");
        assert_eq!(ids.next_id(EntityKind::WeatherStation), "wthrstn2");
        assert_eq!(ids.issued(EntityKind::WeatherStation), 3);
        assert_eq!(ids.issued(EntityKind::Ignition), 0);
    }

    #[test]
    fn separate_generators_are_reproducible() {
        let mut a = IdGenerator::new();
        let mut b = IdGenerator::new();
        for _ in 0..4 {
            assert_eq!(a.next_id(EntityKind::Ignition), b.next_id(EntityKind::Ignition));
        }
    }

    #[test]
    fn sanitize_strips_delimiters() {
        assert_eq!(sanitize_name("a|b||c"), "abc");
        assert_eq!(sanitize_name("plain"), "plain");
        assert_eq!(sanitize_name("|"), "");
        assert_eq!(sanitize_name("north\r\nridge"), "northridge");
    }

    #[test]
    fn sanitized_ids_deserialize() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "deserialize_sanitized")]
            id: String,
        }

        let holder: Holder = serde_json::from_str(r#"{"id": "scen|one"}"#).unwrap();
        assert_eq!(holder.id, "scenone");
    }
}
