//! # File Attachments
//!
//! An attachment carries file contents inside the job instead of pointing at local storage.
//! It is addressed by a synthetic name of the form `attachment:/<index>/<urlencoded-name>`, and
//! that name is accepted anywhere a filename is.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AttachmentError;
use crate::validation::{Validate, ValidationContext, ValidationError};

/// Prefix shared by every synthetic attachment name.
pub const ATTACHMENT_PREFIX: &str = "attachment:/";

const FORBIDDEN_CHARACTERS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

static RESERVED_DEVICE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(nul|prn|con|aux|lpt[0-9]|com[0-9])(\..*)?$")
        .expect("reserved device name pattern is valid")
});

/// Whether `path` is a synthetic attachment name.
pub fn is_attachment_name(path: &str) -> bool {
    path.starts_with(ATTACHMENT_PREFIX)
}

/// Whether `name` is acceptable as an attachment filename.
///
/// A safe name is non-empty, contains none of `\ / : * ? " < > |`, does not start with `.`, and
/// is not a reserved device name (`nul`, `prn`, `con`, `aux`, `lpt#`, `com#`) with or without an
/// extension.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(FORBIDDEN_CHARACTERS)
        && !name.starts_with('.')
        && !RESERVED_DEVICE_NAME.is_match(name)
}

fn encode_component(name: &str) -> String {
    url::form_urlencoded::byte_serialize(name.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// The payload of an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentContents {
    /// UTF-8 text, sent as-is.
    Text(String),
    /// Raw bytes, sent with their length advertised beside the name.
    Binary(Vec<u8>),
}

impl AttachmentContents {
    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            AttachmentContents::Text(text) => text.len(),
            AttachmentContents::Binary(bytes) => bytes.len(),
        }
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The payload as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AttachmentContents::Text(text) => text.as_bytes(),
            AttachmentContents::Binary(bytes) => bytes,
        }
    }
}

/// A file substitute carried inside the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    name: String,
    filename: String,
    contents: AttachmentContents,
}

impl FileAttachment {
    /// Creates the attachment stored at `index` in its job.
    pub fn new(
        index: usize,
        filename: &str,
        contents: AttachmentContents,
    ) -> Result<Self, AttachmentError> {
        if !is_safe_filename(filename) {
            return Err(AttachmentError::UnsafeFilename(filename.to_string()));
        }
        Ok(Self {
            name: format!("{}{}/{}", ATTACHMENT_PREFIX, index, encode_component(filename)),
            filename: filename.to_string(),
            contents,
        })
    }

    /// The synthetic name to use wherever a filename is expected.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The filename the attachment was registered under.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The attachment payload.
    pub fn contents(&self) -> &AttachmentContents {
        &self.contents
    }
}

impl Validate for FileAttachment {
    fn check_valid(&self, _ctx: &ValidationContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if !is_safe_filename(&self.filename) {
            errors.push(
                ValidationError::new("filename", "is not a safe filename")
                    .with_value(&self.filename),
            );
        }
        if !is_attachment_name(&self.name) {
            errors.push(
                ValidationError::new("name", "is not an attachment name").with_value(&self.name),
            );
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_filenames() {
        assert!(is_safe_filename("weather.txt"));
        assert!(is_safe_filename("my fuel map.asc"));
        assert!(is_safe_filename("console.log"));
        assert!(is_safe_filename("com10"));
    }

    #[test]
    fn unsafe_filenames() {
        for name in [
            "",
            ".hidden",
            "a/b.txt",
            "a\\b.txt",
            "c:drive",
            "star*.txt",
            "what?.txt",
            "quote\".txt",
            "<tag>",
            "pipe|name",
            "nul",
            "NUL.txt",
            "prn",
            "con.tar.gz",
            "aux",
            "lpt1",
            "COM9.dat",
        ] {
            assert!(!is_safe_filename(name), "{name:?} should be unsafe");
        }
    }

    #[test]
    fn synthetic_name_is_url_encoded() {
        let attachment = FileAttachment::new(
            3,
            "my weather & more.txt",
            AttachmentContents::Text("x".to_string()),
        )
        .unwrap();
        assert_eq!(attachment.name(), "attachment:/3/my%20weather%20%26%20more.txt");
        assert_eq!(attachment.filename(), "my weather & more.txt");
        assert!(is_attachment_name(attachment.name()));
    }

    #[test]
    fn unsafe_name_is_rejected() {
        let err = FileAttachment::new(0, "aux.txt", AttachmentContents::Binary(vec![1, 2]))
            .unwrap_err();
        assert_eq!(err, AttachmentError::UnsafeFilename("aux.txt".to_string()));
    }

    #[test]
    fn contents_length() {
        assert_eq!(AttachmentContents::Text("héllo".to_string()).len(), 6);
        assert_eq!(AttachmentContents::Binary(vec![0; 4]).len(), 4);
        assert!(AttachmentContents::Binary(vec![]).is_empty());
    }
}
