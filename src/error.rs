//! Error types for schema registration, coercion, decoding and loading.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::FieldType;

/// Errors raised while building or registering a schema descriptor.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema does not specify a content type")]
    MissingContentType,

    #[error("cannot register \"{marker}\" as a custom content type")]
    ReservedContentType { marker: String },

    #[error("schema '{content_type}' declares a field with an empty name")]
    EmptyFieldName { content_type: String },

    #[error("schema '{content_type}' declares field '{name}' more than once")]
    DuplicateField { content_type: String, name: String },

    #[error("invalid schema descriptor: {source}")]
    InvalidDescriptor {
        #[source]
        source: serde_json::Error,
    },
}

/// A value could not be converted to its declared field type.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid integer literal \"{value}\"")]
    InvalidNumber { value: String },

    #[error("invalid object literal \"{value}\": {message}")]
    InvalidObject { value: String, message: String },

    #[error("unrecognized date \"{value}\"")]
    InvalidDate { value: String },

    #[error("cannot convert {actual} to {expected}")]
    Incompatible {
        expected: FieldType,
        actual: &'static str,
    },
}

/// Errors while decoding a JSON document into resources.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported resource type \"{tag}\"")]
    UnsupportedResource { tag: String },

    #[error("missing required field at {path}")]
    MissingField { path: String },

    #[error("invalid value at {path}: expected {expected}, got {actual}")]
    InvalidFieldType {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("field '{field}' of content type '{content_type}': {source}")]
    Format {
        content_type: String,
        field: String,
        #[source]
        source: FormatError,
    },
}

/// Errors while loading documents or schema files.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

impl DecodeError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }

    pub(crate) fn missing(path: impl Into<String>) -> Self {
        DecodeError::MissingField { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("page.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::Schema(SchemaError::MissingContentType);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn decode_error_exit_code() {
        let err = DecodeError::UnsupportedResource { tag: "Link".into() };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn reserved_content_type_display() {
        let err = SchemaError::ReservedContentType {
            marker: "Entry".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot register \"Entry\" as a custom content type"
        );
    }

    #[test]
    fn format_error_names_field() {
        let err = DecodeError::Format {
            content_type: "cat".into(),
            field: "lives".into(),
            source: FormatError::InvalidNumber {
                value: "nine".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "field 'lives' of content type 'cat': invalid integer literal \"nine\""
        );
    }
}
