//! # Wire Codec
//!
//! The backend reads a job as a sequence of two-line records: a bare keyword line followed by
//! one data line whose fields are joined with `|`.  Attachments are framed differently, as
//! `file_attachment`, a header line, the raw payload, and `file_attachment_end`.
//!
//! Encoding is pure.  Entities implement [`Encode`] and append [`Record`]s to a
//! [`RecordWriter`]; the finished [`WireMessage`] renders to bytes with
//! [`WireMessage::to_bytes`] and never touches a socket.
//!
//! ## Field conventions
//!
//! - booleans are `0`/`1`
//! - absent optional fields inside a data line are the literal `null`
//! - times are RFC 3339, dates `YYYY-MM-DD`, durations ISO-8601 style
//! - point lists are a count followed by `lat|lon` pairs
//! - free text has `|` and line breaks replaced by spaces

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};

use crate::attachment::AttachmentContents;
use crate::duration::WiseDuration;
use crate::geometry::LatLon;

/// Line terminator used throughout the protocol.
pub const NEWLINE: &str = "\n";
/// Token for an absent optional field.
pub const NULL: &str = "null";

/// Session keywords.
pub mod session {
    /// Opens a session.
    pub const STARTUP: &str = "STARTUP";
    /// Starts the job body.
    pub const BEGINDATA: &str = "BEGINDATA";
    /// Ends the job body.
    pub const ENDDATA: &str = "ENDDATA";
    /// Asks the backend to start the job and return its name.
    pub const STARTJOB: &str = "STARTJOB";
    /// Closes the session.
    pub const SHUTDOWN: &str = "SHUTDOWN";
    /// Terminates a streamed lookup response.
    pub const COMPLETE: &str = "COMPLETE";
}

/// Record keywords, in the order the job emits them.
pub mod keywords {
    /// Job-level comments.
    pub const GLOBAL_COMMENTS: &str = "global_comments";
    /// Start of an attachment frame.
    pub const FILE_ATTACHMENT: &str = "file_attachment";
    /// End of an attachment frame.
    pub const FILE_ATTACHMENT_END: &str = "file_attachment_end";
    /// Projection file.
    pub const PROJECTION_FILE: &str = "projfile";
    /// Fuel lookup table file.
    pub const LUT_FILE: &str = "lutfile";
    /// Fuel map file.
    pub const FUELMAP_FILE: &str = "fuelmapfile";
    /// Elevation file.
    pub const ELEVATION_FILE: &str = "elevationfile";
    /// Fuel break.
    pub const FUEL_BREAK: &str = "fuelbreak";
    /// Fuel patch.
    pub const FUEL_PATCH: &str = "fuelpatch";
    /// Gridded weather input.
    pub const WEATHER_GRID: &str = "weathergrid";
    /// Weather patch.
    pub const WEATHER_PATCH: &str = "weatherpatch";
    /// Input grid file.
    pub const INPUT_GRID_FILE: &str = "inputgridfile";
    /// Weather station.
    pub const WEATHER_STATION: &str = "weatherstation";
    /// Weather stream.
    pub const WEATHER_STREAM: &str = "weatherstream";
    /// Ignition.
    pub const IGNITION: &str = "ignition";
    /// Opens a scenario.
    pub const SCENARIO_START: &str = "scenariostart";
    /// Scenario times and comments.
    pub const SCENARIO: &str = "scenario";
    /// Copy source of a copied scenario.
    pub const SCENARIO_COPY: &str = "scenariocopy";
    /// Closes a scenario.
    pub const SCENARIO_END: &str = "scenarioend";
    /// Full fire growth model options.
    pub const FGM_OPTIONS: &str = "fgmoptions";
    /// Single fire growth model setting (copy mode).
    pub const FGM_SETTINGS: &str = "fgm_settings";
    /// Full fire behaviour prediction options.
    pub const FBP_OPTIONS: &str = "fbpoptions";
    /// Single fire behaviour prediction setting (copy mode).
    pub const FBP_SETTINGS: &str = "fbp_settings";
    /// Full foliar moisture content options.
    pub const FMC_OPTIONS: &str = "fmcoptions";
    /// Single foliar moisture content setting (copy mode).
    pub const FMC_SETTINGS: &str = "fmc_settings";
    /// Full fire weather index options.
    pub const FWI_OPTIONS: &str = "fwioptions";
    /// Single fire weather index setting (copy mode).
    pub const FWI_SETTINGS: &str = "fwi_settings";
    /// Burning condition.
    pub const BURNING_CONDITION: &str = "burningcondition";
    /// Fuel break reference.
    pub const VECTOR_REF: &str = "vectorref";
    /// Station/stream reference.
    pub const STREAM_REF: &str = "streamref";
    /// Layer reference.
    pub const LAYER_INFO: &str = "layerinfo";
    /// Ignition reference.
    pub const IGNITION_REF: &str = "ignitionref";
    /// Asset reference.
    pub const ASSET_REF: &str = "assetref";
    /// Wind target reference.
    pub const WIND_TARGET: &str = "windtarget";
    /// Vector target reference.
    pub const VECTOR_TARGET: &str = "vectortarget";
    /// Fuel option.
    pub const FUEL_OPTION: &str = "fuel_option";
    /// Asset file.
    pub const ASSET_FILE: &str = "asset_file";
    /// Target file.
    pub const TARGET_FILE: &str = "target_file";
    /// Timezone.
    pub const TIMEZONE: &str = "timezone";
    /// Summary output.
    pub const SUMMARY_FILE: &str = "summaryfile";
    /// Vector output.
    pub const VECTOR_FILE: &str = "vectorfile";
    /// Grid output.
    pub const GRID_FILE: &str = "gridfile";
    /// Fuel grid export.
    pub const FUEL_GRID_EXPORT: &str = "fuel_grid_export";
    /// Statistics output.
    pub const STATS_FILE: &str = "statsfile";
    /// Asset statistics output.
    pub const ASSET_STATS_EXPORT: &str = "asset_stats_export";
    /// Timestep statistic.
    pub const MNG_STATISTIC: &str = "mng_statistic";
    /// Streaming destination.
    pub const OUTPUT_STREAM: &str = "output_stream";
    /// Export unit settings.
    pub const EXPORT_UNITS: &str = "export_units";
    /// Job options.
    pub const JOB_OPTIONS: &str = "job_options";
}

/// Replaces the field delimiter and line breaks in free text.
pub fn escape_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '|' | '\n' | '\r' => ' ',
            c => c,
        })
        .collect()
}

/// Renders a time the way the backend expects.
pub fn format_time(time: &DateTime<FixedOffset>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, false)
}

//////////////////////////////////////////////// Fields ////////////////////////////////////////////////

/// Builder for one `|`-delimited data line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    parts: Vec<String>,
}

impl Fields {
    /// An empty data line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value verbatim.  Callers guarantee it has no delimiter.
    pub fn raw(mut self, value: impl Into<String>) -> Self {
        self.parts.push(value.into());
        self
    }

    /// Appends free text, escaped.
    pub fn text(self, value: &str) -> Self {
        let escaped = escape_text(value);
        self.raw(escaped)
    }

    /// Appends free text, or `null` when absent.
    pub fn opt_text(self, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.text(v),
            None => self.null(),
        }
    }

    /// Appends the `null` token.
    pub fn null(self) -> Self {
        self.raw(NULL)
    }

    /// Appends a floating point number.
    pub fn num(self, value: f64) -> Self {
        self.raw(value.to_string())
    }

    /// Appends a number, or `null` when absent.
    pub fn opt_num(self, value: Option<f64>) -> Self {
        match value {
            Some(v) => self.num(v),
            None => self.null(),
        }
    }

    /// Appends an integer.
    pub fn int(self, value: i64) -> Self {
        self.raw(value.to_string())
    }

    /// Appends an integer, or `null` when absent.
    pub fn opt_int(self, value: Option<i64>) -> Self {
        match value {
            Some(v) => self.int(v),
            None => self.null(),
        }
    }

    /// Appends a boolean as `0`/`1`.
    pub fn flag(self, value: bool) -> Self {
        self.raw(if value { "1" } else { "0" })
    }

    /// Appends a boolean, or `null` when absent.
    pub fn opt_flag(self, value: Option<bool>) -> Self {
        match value {
            Some(v) => self.flag(v),
            None => self.null(),
        }
    }

    /// Appends a duration.
    pub fn duration(self, value: &WiseDuration) -> Self {
        self.raw(value.to_string())
    }

    /// Appends a duration, or `null` when absent.
    pub fn opt_duration(self, value: Option<&WiseDuration>) -> Self {
        match value {
            Some(v) => self.duration(v),
            None => self.null(),
        }
    }

    /// Appends a timestamp.
    pub fn time(self, value: &DateTime<FixedOffset>) -> Self {
        self.raw(format_time(value))
    }

    /// Appends a timestamp, or `null` when absent.
    pub fn opt_time(self, value: Option<&DateTime<FixedOffset>>) -> Self {
        match value {
            Some(v) => self.time(v),
            None => self.null(),
        }
    }

    /// Appends a calendar date.
    pub fn date(self, value: &NaiveDate) -> Self {
        self.raw(value.format("%Y-%m-%d").to_string())
    }

    /// Appends a point count followed by each `lat|lon` pair.
    pub fn points(self, points: &[LatLon]) -> Self {
        let mut fields = self.int(points.len() as i64);
        for point in points {
            fields = fields.num(point.latitude).num(point.longitude);
        }
        fields
    }

    /// Appends every field of `other`.
    pub fn extend(mut self, other: Fields) -> Self {
        self.parts.extend(other.parts);
        self
    }

    /// The fields joined into a data line.
    pub fn join(&self) -> String {
        self.parts.join("|")
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether no fields were added.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

//////////////////////////////////////////////// Record ////////////////////////////////////////////////

/// One unit of the wire format.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A keyword line followed by a data line.
    Line {
        /// The keyword.
        keyword: &'static str,
        /// The data line, without terminator.
        data: String,
    },
    /// An attachment frame.
    Attachment {
        /// Synthetic attachment name.
        name: String,
        /// The payload.
        contents: AttachmentContents,
    },
}

impl Record {
    /// The record's leading keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            Record::Line { keyword, .. } => *keyword,
            Record::Attachment { .. } => keywords::FILE_ATTACHMENT,
        }
    }

    /// The data line, for line records.
    pub fn data(&self) -> Option<&str> {
        match self {
            Record::Line { data, .. } => Some(data),
            Record::Attachment { .. } => None,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Record::Line { keyword, data } => {
                out.extend_from_slice(keyword.as_bytes());
                out.extend_from_slice(NEWLINE.as_bytes());
                out.extend_from_slice(data.as_bytes());
                out.extend_from_slice(NEWLINE.as_bytes());
            }
            Record::Attachment { name, contents } => {
                out.extend_from_slice(keywords::FILE_ATTACHMENT.as_bytes());
                out.extend_from_slice(NEWLINE.as_bytes());
                match contents {
                    AttachmentContents::Text(_) => out.extend_from_slice(name.as_bytes()),
                    AttachmentContents::Binary(bytes) => {
                        out.extend_from_slice(format!("{}|{}", name, bytes.len()).as_bytes())
                    }
                }
                out.extend_from_slice(NEWLINE.as_bytes());
                out.extend_from_slice(contents.as_bytes());
                out.extend_from_slice(NEWLINE.as_bytes());
                out.extend_from_slice(keywords::FILE_ATTACHMENT_END.as_bytes());
                out.extend_from_slice(NEWLINE.as_bytes());
            }
        }
    }
}

////////////////////////////////////////////// WireMessage /////////////////////////////////////////////

/// An encoded job body, ready to be written between `BEGINDATA` and `ENDDATA`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireMessage {
    records: Vec<Record>,
}

impl WireMessage {
    /// The records in emission order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The leading keyword of every record, in order.
    pub fn keywords(&self) -> Vec<&'static str> {
        self.records.iter().map(Record::keyword).collect()
    }

    /// Whether any record uses `keyword`.
    pub fn contains_keyword(&self, keyword: &str) -> bool {
        self.records.iter().any(|r| r.keyword() == keyword)
    }

    /// Data lines of every record using `keyword`.
    pub fn data_for(&self, keyword: &str) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.keyword() == keyword)
            .filter_map(Record::data)
            .collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Renders every record, newline terminated.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for record in &self.records {
            record.write_to(&mut out);
        }
        out
    }
}

////////////////////////////////////////////// RecordWriter ////////////////////////////////////////////

/// Accumulates records in emission order.
#[derive(Debug, Default)]
pub struct RecordWriter {
    records: Vec<Record>,
}

impl RecordWriter {
    /// An empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a keyword record.
    pub fn record(&mut self, keyword: &'static str, fields: Fields) {
        self.records.push(Record::Line {
            keyword,
            data: fields.join(),
        });
    }

    /// Appends an attachment frame.
    pub fn attachment(&mut self, name: &str, contents: &AttachmentContents) {
        self.records.push(Record::Attachment {
            name: name.to_string(),
            contents: contents.clone(),
        });
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Finishes writing.
    pub fn finish(self) -> WireMessage {
        WireMessage {
            records: self.records,
        }
    }
}

/// Something that appends its wire records to a [`RecordWriter`].
pub trait Encode {
    /// Appends this value's records.
    fn encode(&self, out: &mut RecordWriter);
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, out: &mut RecordWriter) {
        for item in self {
            item.encode(out);
        }
    }
}

/// The job name contained in a raw backend response.
pub fn trim_response(raw: &str) -> &str {
    raw.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_render_conventions() {
        let line = Fields::new()
            .text("a|b\nc")
            .flag(true)
            .flag(false)
            .opt_num(None)
            .num(0.2)
            .num(10.0)
            .duration(&WiseDuration::zero())
            .join();
        assert_eq!(line, "a b c|1|0|null|0.2|10|PT0S");
    }

    #[test]
    fn points_are_counted() {
        let line = Fields::new()
            .points(&[LatLon::new(51.5, -115.25), LatLon::new(52.0, -116.0)])
            .join();
        assert_eq!(line, "2|51.5|-115.25|52|-116");
    }

    #[test]
    fn times_render_rfc3339() {
        let time = DateTime::parse_from_rfc3339("2024-06-01T13:00:00-06:00").unwrap();
        assert_eq!(Fields::new().time(&time).join(), "2024-06-01T13:00:00-06:00");
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(Fields::new().date(&date).join(), "2024-06-01");
    }

    #[test]
    fn line_records_are_two_lines() {
        let mut out = RecordWriter::new();
        out.record(keywords::TIMEZONE, Fields::new().int(3).null().null());
        let message = out.finish();
        assert_eq!(message.to_bytes(), b"timezone\n3|null|null\n");
        assert_eq!(message.keywords(), vec!["timezone"]);
        assert_eq!(message.data_for("timezone"), vec!["3|null|null"]);
    }

    #[test]
    fn text_attachment_frame() {
        let mut out = RecordWriter::new();
        out.attachment(
            "attachment:/0/w.txt",
            &AttachmentContents::Text("HOUR,TEMP".to_string()),
        );
        assert_eq!(
            out.finish().to_bytes(),
            b"file_attachment\nattachment:/0/w.txt\nHOUR,TEMP\nfile_attachment_end\n"
        );
    }

    #[test]
    fn binary_attachment_advertises_length() {
        let mut out = RecordWriter::new();
        out.attachment("attachment:/1/g.tif", &AttachmentContents::Binary(vec![0, 255, 10]));
        let mut expected = b"file_attachment\nattachment:/1/g.tif|3\n".to_vec();
        expected.extend_from_slice(&[0, 255, 10]);
        expected.extend_from_slice(b"\nfile_attachment_end\n");
        assert_eq!(out.finish().to_bytes(), expected);
    }

    #[test]
    fn response_is_trimmed() {
        assert_eq!(trim_response("  job_20240601\r\n"), "job_20240601");
    }
}
