//! # Fuel
//!
//! Fuel breaks and fuel patches edit the fuel map, input grid files replace landscape
//! attributes, and fuel options override per-fuel-type defaults.

use serde::{Deserialize, Serialize};

use crate::codec::{Encode, Fields, RecordWriter, keywords};
use crate::geometry::{PatchSource, Shape, check_patch_source};
use crate::ids::{deserialize_sanitized, impl_identified};
use crate::validation::{
    Range, Validate, ValidationContext, ValidationError, check_file, check_range, nest,
    require_text,
};

const PERCENT: Range = Range::closed(0.0, 100.0);
const GRASS_FUEL_LOAD: Range = Range::closed(0.0, 5.0);
const CROWN_BASE_HEIGHT: Range = Range::closed(0.0, 25.0);

////////////////////////////////////////////// Fuel breaks ///////////////////////////////////////////////

/// A line or area that fire cannot cross.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelBreak {
    #[serde(deserialize_with = "deserialize_sanitized")]
    id: String,
    /// The break's geometry.
    pub shape: Shape,
    /// Width in metres, for polyline breaks.
    #[serde(default)]
    pub width: Option<f64>,
    /// Free text.
    #[serde(default)]
    pub comments: String,
}

impl_identified!(FuelBreak);

impl FuelBreak {
    pub(crate) fn new(id: String, shape: Shape) -> Self {
        Self {
            id,
            shape,
            width: None,
            comments: String::new(),
        }
    }
}

impl Validate for FuelBreak {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        nest(&mut errors, "shape", self.shape.check_valid(ctx));
        if let Some(width) = self.width {
            check_range(&mut errors, "width", width, Range::greater_than(0.0));
        }
        errors
    }
}

impl Encode for FuelBreak {
    fn encode(&self, out: &mut RecordWriter) {
        let fields = self.shape.wire_fields(Fields::new().raw(&self.id));
        out.record(
            keywords::FUEL_BREAK,
            fields.opt_num(self.width).text(&self.comments),
        );
    }
}

////////////////////////////////////////////// Fuel patches //////////////////////////////////////////////

/// A class of fuels a patch can replace in one go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FromFuelRule {
    /// Every fuel type.
    AllFuels,
    /// Every combustible fuel type.
    AllCombustible,
    /// Cells with no fuel data.
    NoData,
}

impl FromFuelRule {
    fn wire_value(self) -> i64 {
        match self {
            FromFuelRule::AllFuels => 0,
            FromFuelRule::AllCombustible => 1,
            FromFuelRule::NoData => 2,
        }
    }
}

/// Which cells a fuel patch replaces.  Exactly one form is ever set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FromFuel {
    /// Cells of a named fuel type.
    Fuel(String),
    /// Cells matching a rule.
    Rule(FromFuelRule),
    /// Cells of the fuel at a lookup table index.
    Index(i32),
}

impl FromFuel {
    fn wire_fields(&self, fields: Fields) -> Fields {
        match self {
            FromFuel::Fuel(name) => fields.raw("fuel").text(name),
            FromFuel::Rule(rule) => fields.raw("rule").int(rule.wire_value()),
            FromFuel::Index(index) => fields.raw("index").int((*index).into()),
        }
    }
}

/// Replaces fuel over an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelPatch {
    #[serde(deserialize_with = "deserialize_sanitized")]
    id: String,
    /// The fuel written into matching cells.
    pub to_fuel: String,
    /// Which cells match.
    #[serde(default)]
    pub from: Option<FromFuel>,
    /// The area the patch covers.
    #[serde(default)]
    pub source: Option<PatchSource>,
    /// Free text.
    #[serde(default)]
    pub comments: String,
}

impl_identified!(FuelPatch);

impl FuelPatch {
    pub(crate) fn new(id: String, to_fuel: &str) -> Self {
        Self {
            id,
            to_fuel: to_fuel.to_string(),
            from: None,
            source: None,
            comments: String::new(),
        }
    }
}

impl Validate for FuelPatch {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "toFuel", &self.to_fuel);
        match &self.from {
            None => errors.push(ValidationError::new(
                "fromFuel",
                "one of a fuel, a fuel rule or a fuel index must be set",
            )),
            Some(FromFuel::Fuel(name)) => require_text(&mut errors, "fromFuel", name),
            Some(FromFuel::Index(index)) if *index < 0 => errors.push(
                ValidationError::new("fromFuelIndex", "must not be negative").with_value(index),
            ),
            Some(_) => {}
        }
        check_patch_source(&mut errors, ctx, self.source.as_ref());
        errors
    }
}

impl Encode for FuelPatch {
    fn encode(&self, out: &mut RecordWriter) {
        let mut fields = Fields::new().raw(&self.id).text(&self.to_fuel);
        fields = match &self.from {
            Some(from) => from.wire_fields(fields),
            None => fields.null().null(),
        };
        fields = match &self.source {
            Some(source) => source.wire_fields(fields),
            None => fields.null(),
        };
        out.record(keywords::FUEL_PATCH, fields.text(&self.comments));
    }
}

/////////////////////////////////////////////// Grid files ///////////////////////////////////////////////

/// What an input grid file supplies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridFileType {
    /// Not yet chosen; never valid.
    #[default]
    None,
    /// A replacement fuel grid.
    FuelGrid,
    /// Grass curing degree.
    DegreeCuring,
    /// Green-up state.
    GreenUp,
    /// Percent conifer.
    PercentConifer,
    /// Percent dead fir.
    PercentDeadFir,
    /// Crown base height.
    CrownBaseHeight,
    /// Tree height.
    TreeHeight,
    /// Fuel load.
    FuelLoad,
    /// FBP vector data.
    FbpVector,
}

impl GridFileType {
    /// The numeric value the backend expects.
    pub fn wire_value(self) -> i64 {
        match self {
            GridFileType::None => -1,
            GridFileType::FuelGrid => 0,
            GridFileType::DegreeCuring => 1,
            GridFileType::GreenUp => 2,
            GridFileType::PercentConifer => 3,
            GridFileType::PercentDeadFir => 4,
            GridFileType::CrownBaseHeight => 5,
            GridFileType::TreeHeight => 6,
            GridFileType::FuelLoad => 7,
            GridFileType::FbpVector => 8,
        }
    }
}

/// A grid that overrides one landscape attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridFile {
    #[serde(deserialize_with = "deserialize_sanitized")]
    id: String,
    /// What the grid supplies.
    #[serde(default)]
    pub file_type: GridFileType,
    /// The grid file.
    pub filename: String,
    /// Its projection file.
    pub projection: String,
    /// Free text.
    #[serde(default)]
    pub comments: String,
}

impl_identified!(GridFile);

impl GridFile {
    pub(crate) fn new(id: String, file_type: GridFileType, filename: &str, projection: &str) -> Self {
        Self {
            id,
            file_type,
            filename: filename.to_string(),
            projection: projection.to_string(),
            comments: String::new(),
        }
    }
}

impl Validate for GridFile {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.file_type == GridFileType::None {
            errors.push(ValidationError::new("type", "a grid file type must be chosen"));
        }
        check_file(&mut errors, ctx, "filename", &self.filename);
        check_file(&mut errors, ctx, "projection", &self.projection);
        errors
    }
}

impl Encode for GridFile {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::INPUT_GRID_FILE,
            Fields::new()
                .raw(&self.id)
                .int(self.file_type.wire_value())
                .text(&self.filename)
                .text(&self.projection)
                .text(&self.comments),
        );
    }
}

////////////////////////////////////////////// Fuel options //////////////////////////////////////////////

/// The attribute a fuel option overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelOptionType {
    /// Grass curing percentage.
    GrassCuring,
    /// Percent conifer.
    PercentConifer,
    /// Percent dead fir.
    PercentDeadFir,
    /// Grass fuel load in kg/m².
    GrassFuelLoad,
    /// Crown base height in metres.
    CrownBaseHeight,
}

impl FuelOptionType {
    fn wire_value(self) -> i64 {
        match self {
            FuelOptionType::GrassCuring => 0,
            FuelOptionType::PercentConifer => 1,
            FuelOptionType::PercentDeadFir => 2,
            FuelOptionType::GrassFuelLoad => 3,
            FuelOptionType::CrownBaseHeight => 4,
        }
    }

    fn range(self) -> Range {
        match self {
            FuelOptionType::GrassCuring
            | FuelOptionType::PercentConifer
            | FuelOptionType::PercentDeadFir => PERCENT,
            FuelOptionType::GrassFuelLoad => GRASS_FUEL_LOAD,
            FuelOptionType::CrownBaseHeight => CROWN_BASE_HEIGHT,
        }
    }
}

/// Overrides one attribute of one fuel type for the whole job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelOption {
    /// The fuel type name, e.g. `O-1a`.
    pub fuel_type: String,
    /// The attribute overridden.
    pub option_type: FuelOptionType,
    /// The new value.
    pub value: f64,
}

impl FuelOption {
    /// An override of `option_type` for `fuel_type`.
    pub fn new(fuel_type: &str, option_type: FuelOptionType, value: f64) -> Self {
        Self {
            fuel_type: fuel_type.to_string(),
            option_type,
            value,
        }
    }
}

impl Validate for FuelOption {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "fuelType", &self.fuel_type);
        check_range(&mut errors, "value", self.value, self.option_type.range());
        errors
    }
}

impl Encode for FuelOption {
    fn encode(&self, out: &mut RecordWriter) {
        out.record(
            keywords::FUEL_OPTION,
            Fields::new()
                .text(&self.fuel_type)
                .int(self.option_type.wire_value())
                .num(self.value),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LatLon;

    fn ctx() -> ValidationContext {
        ValidationContext::without_file_checks()
    }

    #[test]
    fn fuel_break_width_must_be_positive() {
        let line = Shape::polyline(vec![LatLon::new(51.0, -115.0), LatLon::new(51.1, -115.0)]);
        let mut fuel_break = FuelBreak::new("fuelbrk0".to_string(), line);
        assert!(fuel_break.is_valid(&ctx()));
        fuel_break.width = Some(0.0);
        let errors = fuel_break.check_valid(&ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property_name, "width");
    }

    #[test]
    fn fuel_break_wire_layout() {
        let mut fuel_break = FuelBreak::new("fuelbrk0".to_string(), Shape::file("attachment:/0/b.shp"));
        fuel_break.comments = "a|b".to_string();
        let mut out = RecordWriter::new();
        fuel_break.encode(&mut out);
        assert_eq!(
            out.finish().data_for("fuelbreak")[0],
            "fuelbrk0|file|attachment:/0/b.shp|null|a b"
        );
    }

    #[test]
    fn fuel_patch_requires_a_from_form() {
        let mut patch = FuelPatch::new("fuelptch0".to_string(), "C-2");
        patch.source = Some(PatchSource::Landscape);
        let errors = patch.check_valid(&ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property_name, "fromFuel");

        patch.from = Some(FromFuel::Index(-1));
        assert_eq!(patch.check_valid(&ctx())[0].property_name, "fromFuelIndex");

        patch.from = Some(FromFuel::Rule(FromFuelRule::NoData));
        assert!(patch.is_valid(&ctx()));
    }

    #[test]
    fn fuel_patch_wire_layout() {
        let mut patch = FuelPatch::new("fuelptch0".to_string(), "O-1a");
        patch.from = Some(FromFuel::Fuel("C-2".to_string()));
        patch.source = Some(PatchSource::File {
            filename: "attachment:/0/p.kml".to_string(),
        });
        let mut out = RecordWriter::new();
        patch.encode(&mut out);
        assert_eq!(
            out.finish().data_for("fuelpatch")[0],
            "fuelptch0|O-1a|fuel|C-2|file|attachment:/0/p.kml|"
        );
    }

    #[test]
    fn grid_file_type_must_be_chosen() {
        let grid = GridFile::new(
            "grdfl0".to_string(),
            GridFileType::None,
            "attachment:/0/g.asc",
            "attachment:/1/g.prj",
        );
        let errors = grid.check_valid(&ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property_name, "type");
        assert_eq!(GridFileType::FbpVector.wire_value(), 8);
    }

    #[test]
    fn fuel_option_ranges_follow_type() {
        assert!(FuelOption::new("O-1a", FuelOptionType::GrassCuring, 100.0).is_valid(&ctx()));
        assert!(!FuelOption::new("O-1a", FuelOptionType::GrassFuelLoad, 5.5).is_valid(&ctx()));
        assert!(!FuelOption::new("C-6", FuelOptionType::CrownBaseHeight, 26.0).is_valid(&ctx()));
        assert!(!FuelOption::new("", FuelOptionType::PercentConifer, 50.0).is_valid(&ctx()));
    }
}
