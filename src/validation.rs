//! # Validation Trees
//!
//! Validation never stops at the first problem and never returns `Err`.  Every entity implements
//! [`Validate`], whose [`check_valid`](Validate::check_valid) returns an ordered list of
//! [`ValidationError`] nodes; an empty list means valid.  Composite entities run their own field
//! checks, then validate each child, wrapping a failing child's errors under a node named after
//! the child's field or index.  The result mirrors the entity graph:
//!
//! ```text
//! scenarios
//! └── 2
//!     └── fgmOptions
//!         └── distRes: must be in [0.2, 10]
//! ```
//!
//! [`leaf_errors`] flattens such a tree into `scenarios[2].fgmOptions.distRes` style paths.
//!
//! ```rust
//! use wise_builder::{FgmOptions, Validate, ValidationContext};
//!
//! let mut options = FgmOptions::default();
//! options.dist_res = Some(12.0);
//! let errors = options.check_valid(&ValidationContext::default());
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].property_name, "distRes");
//! ```

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::attachment::is_attachment_name;
use crate::ids::Identified;

/////////////////////////////////////////// ValidationError ////////////////////////////////////////////

/// One node of a validation error tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// The field name, or the decimal index for collection entries.
    pub property_name: String,
    /// Human readable description of the problem.
    pub message: String,
    /// Id of the entity that owns the field, when it has one.
    pub object_id: Option<String>,
    /// Rendering of the offending value at the time of validation.
    pub value: Option<String>,
    /// Nested errors; empty for leaves.
    pub children: Vec<ValidationError>,
}

impl ValidationError {
    /// A leaf error for `property_name`.
    pub fn new(property_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            message: message.into(),
            object_id: None,
            value: None,
            children: Vec::new(),
        }
    }

    /// An interior node grouping `children` under `property_name`.
    pub fn parent(
        property_name: impl Into<String>,
        message: impl Into<String>,
        children: Vec<ValidationError>,
    ) -> Self {
        Self {
            children,
            ..Self::new(property_name, message)
        }
    }

    /// Records the offending value.
    pub fn with_value(mut self, value: impl Display) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Records the id of the entity that owns the field.
    pub fn with_object(mut self, id: &str) -> Self {
        self.object_id = Some(id.to_string());
        self
    }

    /// Whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaves below (and including) this node.
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(ValidationError::leaf_count).sum()
        }
    }

    /// Finds a direct child by property name.
    pub fn child(&self, property_name: &str) -> Option<&ValidationError> {
        self.children
            .iter()
            .find(|c| c.property_name == property_name)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.property_name, self.message)?;
        if let Some(value) = &self.value {
            write!(f, " (got {})", value)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A leaf of a validation tree together with its rendered path.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafError<'a> {
    /// Path from the root, e.g. `scenarios[2].fgmOptions.distRes`.
    pub path: String,
    /// The leaf node itself.
    pub error: &'a ValidationError,
}

fn append_segment(path: &str, segment: &str) -> String {
    if segment.chars().all(|c| c.is_ascii_digit()) && !segment.is_empty() {
        format!("{}[{}]", path, segment)
    } else if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}

fn collect_leaves<'a>(error: &'a ValidationError, prefix: &str, out: &mut Vec<LeafError<'a>>) {
    let path = append_segment(prefix, &error.property_name);
    if error.is_leaf() {
        out.push(LeafError { path, error });
    } else {
        for child in &error.children {
            collect_leaves(child, &path, out);
        }
    }
}

/// Flattens a list of error trees into their leaves, depth first, in tree order.
pub fn leaf_errors(errors: &[ValidationError]) -> Vec<LeafError<'_>> {
    let mut out = Vec::new();
    for error in errors {
        collect_leaves(error, "", &mut out);
    }
    out
}

/////////////////////////////////////////// ValidationContext //////////////////////////////////////////

/// Knobs that change how validation treats the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationContext {
    /// Whether file references must exist on local storage.  Attachments always pass.
    pub check_files: bool,
}

impl ValidationContext {
    /// A context that skips file existence checks, for dry validation.
    pub fn without_file_checks() -> Self {
        Self { check_files: false }
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self { check_files: true }
    }
}

/////////////////////////////////////////////// Validate ///////////////////////////////////////////////

/// Something that can produce a validation error tree.
pub trait Validate {
    /// Every problem with `self`, in field order.  Empty means valid.
    fn check_valid(&self, ctx: &ValidationContext) -> Vec<ValidationError>;

    /// Whether [`check_valid`](Validate::check_valid) finds nothing.
    fn is_valid(&self, ctx: &ValidationContext) -> bool {
        self.check_valid(ctx).is_empty()
    }
}

/// Wraps `children` under a node named `property_name` if there are any.
pub fn nest(
    errors: &mut Vec<ValidationError>,
    property_name: &str,
    children: Vec<ValidationError>,
) {
    if !children.is_empty() {
        errors.push(ValidationError::parent(
            property_name,
            format!("{} contains invalid values", property_name),
            children,
        ));
    }
}

/// Validates each item of a collection of identified entities.
///
/// Returns one node per failing index.  An id equal (ignoring case) to an earlier item's id adds
/// a duplicate error under the later index.  `extra` contributes checks that need context from
/// outside the item.
pub fn validate_collection<T, F>(
    items: &[T],
    ctx: &ValidationContext,
    mut extra: F,
) -> Vec<ValidationError>
where
    T: Validate + Identified,
    F: FnMut(usize, &T) -> Vec<ValidationError>,
{
    validate_entries(items, |index, item| {
        let mut errors = item.check_valid(ctx);
        errors.extend(extra(index, item));
        errors
    })
}

/// Like [`validate_collection`], with `check` replacing the item's own validation.
pub fn validate_entries<T, F>(items: &[T], mut check: F) -> Vec<ValidationError>
where
    T: Identified,
    F: FnMut(usize, &T) -> Vec<ValidationError>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let mut item_errors = check(index, item);
        let key = item.id().to_lowercase();
        if key.is_empty() {
            item_errors.push(ValidationError::new("id", "must not be empty").with_value(""));
        } else if let Some(first) = seen.get(&key) {
            item_errors.push(
                ValidationError::new(
                    "id",
                    format!("duplicate id; already used by entry {}", first),
                )
                .with_object(item.id())
                .with_value(item.id()),
            );
        } else {
            seen.insert(key, index);
        }
        if !item_errors.is_empty() {
            errors.push(
                ValidationError::parent(
                    index.to_string(),
                    format!("entry {} is invalid", index),
                    item_errors,
                )
                .with_object(item.id()),
            );
        }
    }
    errors
}

/// Validates each item of a collection without ids, one node per failing index.
pub fn validate_list<T: Validate>(items: &[T], ctx: &ValidationContext) -> Vec<ValidationError> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let item_errors = item.check_valid(ctx);
            if item_errors.is_empty() {
                None
            } else {
                Some(ValidationError::parent(
                    index.to_string(),
                    format!("entry {} is invalid", index),
                    item_errors,
                ))
            }
        })
        .collect()
}

//////////////////////////////////////////////// Ranges ////////////////////////////////////////////////

/// One end of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// The end point is part of the range.
    Inclusive(f64),
    /// The end point is not part of the range.
    Exclusive(f64),
    /// No limit on this side.
    Unbounded,
}

/// A numeric range used to check a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    /// Lower end.
    pub lower: Bound,
    /// Upper end.
    pub upper: Bound,
}

impl Range {
    /// `[lower, upper]`
    pub const fn closed(lower: f64, upper: f64) -> Self {
        Self {
            lower: Bound::Inclusive(lower),
            upper: Bound::Inclusive(upper),
        }
    }

    /// `[lower, upper)`
    pub const fn half_open(lower: f64, upper: f64) -> Self {
        Self {
            lower: Bound::Inclusive(lower),
            upper: Bound::Exclusive(upper),
        }
    }

    /// `(lower, upper)`
    pub const fn open(lower: f64, upper: f64) -> Self {
        Self {
            lower: Bound::Exclusive(lower),
            upper: Bound::Exclusive(upper),
        }
    }

    /// `(lower, upper]`
    pub const fn open_closed(lower: f64, upper: f64) -> Self {
        Self {
            lower: Bound::Exclusive(lower),
            upper: Bound::Inclusive(upper),
        }
    }

    /// `[lower, ∞)`
    pub const fn at_least(lower: f64) -> Self {
        Self {
            lower: Bound::Inclusive(lower),
            upper: Bound::Unbounded,
        }
    }

    /// `(lower, ∞)`
    pub const fn greater_than(lower: f64) -> Self {
        Self {
            lower: Bound::Exclusive(lower),
            upper: Bound::Unbounded,
        }
    }

    /// Whether `value` lies in the range.  NaN never does.
    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        let lower_ok = match self.lower {
            Bound::Inclusive(l) => value >= l,
            Bound::Exclusive(l) => value > l,
            Bound::Unbounded => true,
        };
        let upper_ok = match self.upper {
            Bound::Inclusive(u) => value <= u,
            Bound::Exclusive(u) => value < u,
            Bound::Unbounded => true,
        };
        lower_ok && upper_ok
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.lower {
            Bound::Inclusive(l) => write!(f, "[{}", l)?,
            Bound::Exclusive(l) => write!(f, "({}", l)?,
            Bound::Unbounded => write!(f, "(-inf")?,
        }
        match self.upper {
            Bound::Inclusive(u) => write!(f, ", {}]", u),
            Bound::Exclusive(u) => write!(f, ", {})", u),
            Bound::Unbounded => write!(f, ", inf)"),
        }
    }
}

/// Pushes an error if `value` is outside `range`.
pub fn check_range(errors: &mut Vec<ValidationError>, property: &str, value: f64, range: Range) {
    if !range.contains(value) {
        errors.push(
            ValidationError::new(property, format!("must be in {}", range)).with_value(value),
        );
    }
}

/// Like [`check_range`], skipping unset values.
pub fn check_optional_range(
    errors: &mut Vec<ValidationError>,
    property: &str,
    value: Option<f64>,
    range: Range,
) {
    if let Some(value) = value {
        check_range(errors, property, value, range);
    }
}

/// Pushes a "required" error if `value` is unset, returning whether it was set.
pub fn require<T>(errors: &mut Vec<ValidationError>, property: &str, value: &Option<T>) -> bool {
    if value.is_none() {
        errors.push(ValidationError::new(property, "is required"));
        false
    } else {
        true
    }
}

/// Pushes an error if `value` is empty.
pub fn require_text(errors: &mut Vec<ValidationError>, property: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(property, "must not be empty"));
    }
}

///////////////////////////////////////////// File references //////////////////////////////////////////

/// Whether `path` is an attachment name or, when the context asks for it, an existing file.
pub fn file_reference_ok(ctx: &ValidationContext, path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    is_attachment_name(path) || !ctx.check_files || Path::new(path).exists()
}

/// Pushes an error if `path` does not name an attachment or a readable local file.
pub fn check_file(
    errors: &mut Vec<ValidationError>,
    ctx: &ValidationContext,
    property: &str,
    path: &str,
) {
    if path.is_empty() {
        errors.push(ValidationError::new(property, "file is not set"));
    } else if !file_reference_ok(ctx, path) {
        errors.push(ValidationError::new(property, "file does not exist").with_value(path));
    }
}

/// Like [`check_file`], skipping unset paths.
pub fn check_optional_file(
    errors: &mut Vec<ValidationError>,
    ctx: &ValidationContext,
    property: &str,
    path: Option<&str>,
) {
    if let Some(path) = path {
        check_file(errors, ctx, property, path);
    }
}
