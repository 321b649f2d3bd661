//! Document and schema loading from various sources.
//!
//! Handles loading CDA payloads from files, strings, and HTTP URLs, and
//! schema descriptor files into a [`SchemaRegistry`].

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::schema::SchemaRegistry;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "loaded document");
    load_document_str(&content)
}

/// Load a JSON document from a string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_document_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Fetch a JSON document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default). A single GET, no
/// retries.
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails, the server
/// answers with an error status, or the body isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, LoadError> {
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    let response = client.get(url).send().map_err(network)?;

    // Check for HTTP errors before parsing
    let response = response.error_for_status().map_err(network)?;

    tracing::debug!(url, status = %response.status(), "fetched document");
    response.json().map_err(network)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a document from a file path or URL.
///
/// URL loading requires the `remote` feature.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_document_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}

/// Load schema descriptors from a file into a fresh registry.
///
/// The file holds one descriptor object or an array of them.
///
/// # Errors
///
/// Returns the IO/JSON errors of [`load_document`], or `LoadError::Schema`
/// if a descriptor is malformed or rejected by the registry.
pub fn load_schemas(path: &Path) -> Result<SchemaRegistry, LoadError> {
    let mut registry = SchemaRegistry::new();
    load_schemas_into(&mut registry, path)?;
    Ok(registry)
}

/// Load schema descriptors from a file into an existing registry.
///
/// Later files override content types registered by earlier ones.
///
/// # Errors
///
/// Same as [`load_schemas`].
pub fn load_schemas_into(registry: &mut SchemaRegistry, path: &Path) -> Result<(), LoadError> {
    let value = load_document(path)?;
    for descriptor in crate::schema::descriptors_from_json(&value)? {
        registry.register(descriptor)?;
    }
    Ok(())
}
