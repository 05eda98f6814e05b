//! Locations and the shapes ignitions, assets, targets and fuel breaks are drawn with.

use serde::{Deserialize, Serialize};

use crate::codec::Fields;
use crate::validation::{
    Range, Validate, ValidationContext, ValidationError, check_file, check_range,
};

const LATITUDE: Range = Range::closed(-90.0, 90.0);
const LONGITUDE: Range = Range::closed(-180.0, 180.0);

/// A WGS84 location in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude, positive north.
    pub latitude: f64,
    /// Longitude, positive east.
    pub longitude: f64,
}

impl LatLon {
    /// A location from latitude and longitude.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Validate for LatLon {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_range(&mut errors, "latitude", self.latitude, LATITUDE);
        check_range(&mut errors, "longitude", self.longitude, LONGITUDE);
        errors
    }
}

/// How a shape's geometry is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Geometry is read from a vector file.
    File,
    /// A single point.
    Point,
    /// An open line through at least two points.
    Polyline,
    /// A closed ring of at least three points.
    Polygon,
}

impl ShapeKind {
    /// The name used on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            ShapeKind::File => "file",
            ShapeKind::Point => "point",
            ShapeKind::Polyline => "polyline",
            ShapeKind::Polygon => "polygon",
        }
    }
}

/// Geometry given either inline or as a file reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// How the geometry is given.
    pub kind: ShapeKind,
    /// The vector file, for [`ShapeKind::File`].
    #[serde(default)]
    pub filename: String,
    /// Inline vertices, for every other kind.
    #[serde(default)]
    pub points: Vec<LatLon>,
}

impl Shape {
    /// Geometry read from `filename`.
    pub fn file(filename: &str) -> Self {
        Self {
            kind: ShapeKind::File,
            filename: filename.to_string(),
            points: Vec::new(),
        }
    }

    /// A single point.
    pub fn point(location: LatLon) -> Self {
        Self {
            kind: ShapeKind::Point,
            filename: String::new(),
            points: vec![location],
        }
    }

    /// A polyline through `points`.
    pub fn polyline(points: Vec<LatLon>) -> Self {
        Self {
            kind: ShapeKind::Polyline,
            filename: String::new(),
            points,
        }
    }

    /// A polygon with vertices `points`.
    pub fn polygon(points: Vec<LatLon>) -> Self {
        Self {
            kind: ShapeKind::Polygon,
            filename: String::new(),
            points,
        }
    }

    /// Appends `kind|filename` or `kind|count|lat|lon...`.
    pub fn wire_fields(&self, fields: Fields) -> Fields {
        let fields = fields.raw(self.kind.wire_name());
        match self.kind {
            ShapeKind::File => fields.text(&self.filename),
            _ => fields.points(&self.points),
        }
    }
}

impl Validate for Shape {
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let minimum = match self.kind {
            ShapeKind::File => {
                check_file(&mut errors, ctx, "filename", &self.filename);
                return errors;
            }
            ShapeKind::Point => 1,
            ShapeKind::Polyline => 2,
            ShapeKind::Polygon => 3,
        };
        if self.points.len() < minimum {
            errors.push(
                ValidationError::new(
                    "points",
                    format!(
                        "a {} needs at least {} point(s)",
                        self.kind.wire_name(),
                        minimum
                    ),
                )
                .with_value(self.points.len()),
            );
        } else if self.kind == ShapeKind::Point && self.points.len() > 1 {
            errors.push(
                ValidationError::new("points", "a point has exactly one location")
                    .with_value(self.points.len()),
            );
        }
        for (index, point) in self.points.iter().enumerate() {
            let point_errors = point.check_valid(ctx);
            if !point_errors.is_empty() {
                errors.push(ValidationError::parent(
                    index.to_string(),
                    format!("point {} is invalid", index),
                    point_errors,
                ));
            }
        }
        errors
    }
}

/// Where a patch applies: a vector file, an inline polygon, or the whole landscape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchSource {
    /// Area read from a vector file.
    File {
        /// The vector file.
        filename: String,
    },
    /// Area bounded by an inline polygon.
    Polygon {
        /// Polygon vertices.
        points: Vec<LatLon>,
    },
    /// The entire landscape.
    Landscape,
}

impl PatchSource {
    /// Appends `file|name`, `polygon|count|lat|lon...` or `landscape`.
    pub fn wire_fields(&self, fields: Fields) -> Fields {
        match self {
            PatchSource::File { filename } => fields.raw("file").text(filename),
            PatchSource::Polygon { points } => fields.raw("polygon").points(points),
            PatchSource::Landscape => fields.raw("landscape"),
        }
    }
}

/// Checks an optional patch source, nesting problems under `source`.
pub fn check_patch_source(
    errors: &mut Vec<ValidationError>,
    ctx: &ValidationContext,
    source: Option<&PatchSource>,
) {
    match source {
        None => errors.push(ValidationError::new(
            "source",
            "one of file, polygon or landscape must be set",
        )),
        Some(PatchSource::File { filename }) => {
            let mut children = Vec::new();
            check_file(&mut children, ctx, "filename", filename);
            crate::validation::nest(errors, "source", children);
        }
        Some(PatchSource::Polygon { points }) => {
            let shape = Shape::polygon(points.clone());
            crate::validation::nest(errors, "source", shape.check_valid(ctx));
        }
        Some(PatchSource::Landscape) => {}
    }
}
