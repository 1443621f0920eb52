use crate::error::Result;
use crate::routes::{HttpMethod, Tag};
use crate::schema_generator::Schema;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Specification document assembled by one aggregation pass.
///
/// Operations are keyed by (path, method). Registering the same pair twice keeps the later
/// operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    /// OpenAPI version
    openapi: String,
    /// OpenAPI info section
    info: Info,
    /// Paths collection (URL path -> PathItem)
    paths: BTreeMap<String, PathItem>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// Free-form info entries (description, contact, license, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// POST operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// PUT operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// DELETE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// PATCH operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// OPTIONS operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Responses by status code; empty when the handler documents no response
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Response>,
    /// Parameters
    pub parameters: Vec<Parameter>,
    /// Operation summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Operation description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping tags
    pub tags: Vec<Tag>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query, header)
    #[serde(rename = "in")]
    pub location: String,
    /// Parameter schema
    pub schema: Schema,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    /// API paths
    pub paths: BTreeMap<String, PathItem>,
}

impl PathItem {
    /// Returns the operation registered for `method`, if any.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method whose slot is read
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        self.slot(method).as_ref()
    }

    fn slot(&self, method: HttpMethod) -> &Option<Operation> {
        match method {
            HttpMethod::Get => &self.get,
            HttpMethod::Post => &self.post,
            HttpMethod::Put => &self.put,
            HttpMethod::Delete => &self.delete,
            HttpMethod::Patch => &self.patch,
            HttpMethod::Options => &self.options,
            HttpMethod::Head => &self.head,
        }
    }

    fn slot_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        }
    }

    /// Number of operations on this path
    pub fn len(&self) -> usize {
        HttpMethod::ALL
            .iter()
            .filter(|method| self.slot(**method).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SpecDocument {
    /// Creates an empty document.
    ///
    /// # Arguments
    ///
    /// * `title` - Application title for the info block
    /// * `version` - Application version for the info block
    /// * `openapi_version` - OpenAPI version written at the top level
    /// * `info` - Free-form entries merged into the info block
    pub fn new(
        title: impl Into<String>,
        version: impl Into<String>,
        openapi_version: impl Into<String>,
        info: BTreeMap<String, Value>,
    ) -> Self {
        let title = title.into();
        debug!("Starting specification document for {}", title);
        Self {
            openapi: openapi_version.into(),
            info: Info {
                title,
                version: version.into(),
                extra: info,
            },
            paths: BTreeMap::new(),
        }
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn openapi_version(&self) -> &str {
        &self.openapi
    }

    pub fn paths(&self) -> &BTreeMap<String, PathItem> {
        &self.paths
    }

    /// Looks up the operation registered at (path, method).
    ///
    /// # Arguments
    ///
    /// * `path` - Path in OpenAPI `{param}` form
    /// * `method` - HTTP method of the operation
    ///
    /// # Returns
    ///
    /// Returns the operation, or `None` when nothing is registered there.
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.paths.get(path)?.operation(method)
    }

    /// Number of (path, method) operations in the document
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(PathItem::len).sum()
    }

    /// Inserts an operation, replacing any operation already registered for (path, method).
    ///
    /// A replacement is logged as a warning.
    ///
    /// # Arguments
    ///
    /// * `path` - Path template; converted with [`Self::convert_path_format`]
    /// * `method` - HTTP method of the operation
    /// * `operation` - The operation to store
    ///
    /// # Returns
    ///
    /// Returns the same document, for chaining further insertions.
    pub fn insert_operation(&mut self, path: &str, method: HttpMethod, operation: Operation) -> &mut Self {
        let openapi_path = Self::convert_path_format(path);
        debug!("Adding operation: {} {}", method, openapi_path);

        let slot = self.paths.entry(openapi_path.clone()).or_default().slot_mut(method);
        if slot.is_some() {
            warn!(
                "Operation {} {} registered more than once, keeping the latest",
                method, openapi_path
            );
        }
        *slot = Some(operation);
        self
    }

    /// Converts a path template to OpenAPI `{param}` form.
    ///
    /// Accepts `:param`, `<param>`, `<converter:param>` and `{param}` segments.
    ///
    /// # Arguments
    ///
    /// * `path` - Path template as registered by the application
    ///
    /// # Returns
    ///
    /// Returns the path with every parameter segment rewritten as `{name}`.
    ///
    /// # Example
    ///
    /// ```
    /// use openapi_from_routes::openapi_builder::SpecDocument;
    ///
    /// assert_eq!(SpecDocument::convert_path_format("/users/<int:id>"), "/users/{id}");
    /// assert_eq!(SpecDocument::convert_path_format("/posts/:slug"), "/posts/{slug}");
    /// ```
    pub fn convert_path_format(path: &str) -> String {
        let parts: Vec<&str> = path.split('/').collect();
        let converted_parts: Vec<String> = parts
            .iter()
            .map(|part| {
                if let Some(name) = part.strip_prefix(':') {
                    format!("{{{}}}", name)
                } else if let Some(inner) = part.strip_prefix('<').and_then(|p| p.strip_suffix('>')) {
                    let name = inner.rsplit(':').next().unwrap_or(inner);
                    format!("{{{}}}", name)
                } else {
                    part.to_string()
                }
            })
            .collect();

        converted_parts.join("/")
    }

    /// Clones the current state into an [`OpenApiDocument`].
    ///
    /// The builder stays usable, so more operations can be inserted afterwards.
    pub fn to_document(&self) -> OpenApiDocument {
        OpenApiDocument {
            openapi: self.openapi.clone(),
            info: self.info.clone(),
            paths: self.paths.clone(),
        }
    }

    /// Consumes the builder and returns the final document.
    ///
    /// # Returns
    ///
    /// Returns the [`OpenApiDocument`] ready for serialization.
    pub fn build(self) -> OpenApiDocument {
        debug!("Building final OpenAPI document");
        OpenApiDocument {
            openapi: self.openapi,
            info: self.info,
            paths: self.paths,
        }
    }

    /// Projects the document into a structured (dict) value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationError`](crate::error::Error::SerializationError) if the
    /// document cannot be represented as JSON.
    pub fn to_dict(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_document())?)
    }

    /// Projects the document into YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationError`](crate::error::Error::SerializationError) if YAML
    /// serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_document())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn new_document() -> SpecDocument {
        SpecDocument::new("Test API", "1.0.0", "3.0.0", BTreeMap::new())
    }

    fn operation(summary: &str) -> Operation {
        Operation {
            responses: BTreeMap::new(),
            parameters: Vec::new(),
            summary: Some(summary.to_string()),
            description: None,
            tags: vec![Tag::new("Test")],
        }
    }

    #[test]
    fn test_new_document() {
        let mut info = BTreeMap::new();
        info.insert("description".to_string(), json!("A test API"));
        let document = SpecDocument::new("My API", "2.0.0", "3.0.2", info);

        assert_eq!(document.info().title, "My API");
        assert_eq!(document.info().version, "2.0.0");
        assert_eq!(document.openapi_version(), "3.0.2");
        assert!(document.paths().is_empty());
    }

    #[test]
    fn test_add_routes_different_methods() {
        let mut document = new_document();
        for method in [HttpMethod::Get, HttpMethod::Post, HttpMethod::Delete] {
            document.insert_operation("/resource", method, operation(method.as_str()));
        }

        assert_eq!(document.paths().len(), 1);
        assert_eq!(document.operation_count(), 3);
        let path_item = &document.paths()["/resource"];
        assert!(path_item.get.is_some());
        assert!(path_item.post.is_some());
        assert!(path_item.delete.is_some());
        assert!(path_item.put.is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut document = new_document();
        document
            .insert_operation("/status", HttpMethod::Get, operation("first"))
            .insert_operation("/status", HttpMethod::Get, operation("second"));

        assert_eq!(document.operation_count(), 1);
        let op = document.operation("/status", HttpMethod::Get).unwrap();
        assert_eq!(op.summary.as_deref(), Some("second"));
    }

    #[test]
    fn test_convert_path_format() {
        assert_eq!(
            SpecDocument::convert_path_format("/users/:id/posts/:post_id"),
            "/users/{id}/posts/{post_id}"
        );
        assert_eq!(
            SpecDocument::convert_path_format("/users/<int:id>/posts/<slug>"),
            "/users/{id}/posts/{slug}"
        );
        assert_eq!(
            SpecDocument::convert_path_format("/users/{id}"),
            "/users/{id}"
        );
        assert_eq!(SpecDocument::convert_path_format("/users/list"), "/users/list");
    }

    #[test]
    fn test_dict_projection() {
        let mut info = BTreeMap::new();
        info.insert("description".to_string(), json!("A test API"));
        let mut document = SpecDocument::new("Test API", "1.0.0", "3.0.0", info);
        document.insert_operation("/health", HttpMethod::Get, operation("Health"));

        let value = document.to_dict().unwrap();
        assert_eq!(
            value,
            json!({
                "openapi": "3.0.0",
                "info": {"title": "Test API", "version": "1.0.0", "description": "A test API"},
                "paths": {
                    "/health": {
                        "get": {
                            "parameters": [],
                            "summary": "Health",
                            "tags": [{"name": "Test"}]
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_yaml_projection() {
        let mut document = new_document();
        document.insert_operation("/users/<int:id>", HttpMethod::Get, operation("User"));

        let yaml = document.to_yaml().unwrap();
        assert!(yaml.contains("openapi:"));
        assert!(yaml.contains("3.0.0"));
        assert!(yaml.contains("/users/{id}"));
        assert!(yaml.contains("get:"));
    }

    #[test]
    fn test_build_matches_snapshot() {
        let mut document = new_document();
        document.insert_operation("/a", HttpMethod::Put, operation("A"));
        let snapshot = document.to_document();
        assert_eq!(document.build(), snapshot);
    }
}
