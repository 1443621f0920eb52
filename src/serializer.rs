//! Serialization of generated documents to YAML or JSON.
//!
//! The document is the structured (dict) projection produced by
//! [`SpecDocument`](crate::openapi_builder::SpecDocument); this module only renders it as text
//! and writes it out.

use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Converts an OpenAPI document into a structured JSON value.
///
/// The value can be edited further before it is rendered.
///
/// # Arguments
///
/// * `doc` - The OpenAPI document to convert
///
/// # Returns
///
/// Returns the document as a `serde_json::Value` tree.
///
/// # Errors
///
/// Returns an error if the document cannot be represented as JSON.
pub fn to_value(doc: &OpenApiDocument) -> Result<Value> {
    serde_json::to_value(doc).context("Failed to convert OpenAPI document to a structured value")
}

/// Serializes an OpenAPI document to YAML.
///
/// # Arguments
///
/// * `doc` - The OpenAPI document to serialize
///
/// # Returns
///
/// Returns the YAML string representation of the document.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use openapi_from_routes::aggregator::{AutoDoc, AutoDocConfig};
/// use openapi_from_routes::routes::RouteTable;
/// use openapi_from_routes::serializer::serialize_yaml;
///
/// let auto_doc = AutoDoc::new(AutoDocConfig::new("Empty App"));
/// let document = auto_doc.aggregate(&RouteTable::new()).build();
/// let yaml = serialize_yaml(&document).unwrap();
/// assert!(yaml.contains("Empty App"));
/// ```
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenAPI document to YAML")
}

/// Serializes an OpenAPI document to JSON with pretty printing.
///
/// # Arguments
///
/// * `doc` - The OpenAPI document to serialize
///
/// # Returns
///
/// Returns the indented JSON string representation of the document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenAPI document to JSON")
}

/// Writes content to a file, creating parent directories as needed.
///
/// An existing file at `path` is overwritten.
///
/// # Arguments
///
/// * `content` - The text to write
/// * `path` - Destination file path
///
/// # Errors
///
/// Returns an error if a parent directory cannot be created or the file cannot be written.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
