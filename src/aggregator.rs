//! Route aggregation.
//!
//! [`AutoDoc`] walks every endpoint of a [`HostApplication`], picks out the handlers that carry
//! a [`RouteDoc`], and writes one operation per (path, verb) into a fresh [`SpecDocument`].
//! Each pass is independent and holds no state beyond the configuration fixed at construction,
//! so running it twice against an unchanged application yields identical documents.

use crate::openapi_builder::{MediaType, Operation, Parameter, Response, SpecDocument};
use crate::responses::{ResponseRegistry, TEXT_CONTENT_TYPE};
use crate::routes::{HostApplication, HttpMethod, RouteDoc, Tag};
use crate::schema_generator::{synthesize, FieldMap, FieldOptions, Schema};
use crate::type_classifier::{classify, Shape};
use crate::type_info::TypeInfo;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;

/// Content type used when a response kind does not declare one
pub const FALLBACK_CONTENT_TYPE: &str = TEXT_CONTENT_TYPE;

/// Verbs documented unless configured otherwise
pub const DEFAULT_DOCUMENTED_VERBS: [HttpMethod; 5] = [
    HttpMethod::Get,
    HttpMethod::Post,
    HttpMethod::Put,
    HttpMethod::Delete,
    HttpMethod::Patch,
];

/// Static configuration of the documentation generator
#[derive(Debug, Clone, PartialEq)]
pub struct AutoDocConfig {
    /// Application title
    pub title: String,
    /// Application version
    pub app_version: String,
    /// OpenAPI spec version presented
    pub openapi_version: String,
    /// Free-form info entries
    pub info: BTreeMap<String, Value>,
    /// Tag for operations that declare none; falls back to the title
    pub default_tag: Option<String>,
    /// Verbs that produce operations; others (e.g. implicit HEAD/OPTIONS) are ignored
    pub documented_verbs: Vec<HttpMethod>,
    /// Document handlers without metadata too, as bare operations
    pub always_document: bool,
}

impl AutoDocConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            app_version: "1.0.0".to_string(),
            openapi_version: "3.0.0".to_string(),
            info: BTreeMap::new(),
            default_tag: None,
            documented_verbs: DEFAULT_DOCUMENTED_VERBS.to_vec(),
            always_document: false,
        }
    }

    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    pub fn openapi_version(mut self, version: impl Into<String>) -> Self {
        self.openapi_version = version.into();
        self
    }

    pub fn info_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.info.insert(key.into(), value);
        self
    }

    pub fn default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = Some(tag.into());
        self
    }

    pub fn documented_verbs(mut self, verbs: Vec<HttpMethod>) -> Self {
        self.documented_verbs = verbs;
        self
    }

    pub fn always_document(mut self, always: bool) -> Self {
        self.always_document = always;
        self
    }
}

/// Resolved response body of an operation
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseContent {
    pub content_type: String,
    pub schema: Schema,
}

/// Documentation generator for one application
pub struct AutoDoc {
    config: AutoDocConfig,
    default_tag: Tag,
    registry: ResponseRegistry,
}

impl AutoDoc {
    /// Create a generator using the built-in response kinds
    pub fn new(config: AutoDocConfig) -> Self {
        Self::with_registry(config, ResponseRegistry::standard())
    }

    /// Create a generator with a custom response registry
    pub fn with_registry(config: AutoDocConfig, registry: ResponseRegistry) -> Self {
        let default_tag = Tag::new(config.default_tag.clone().unwrap_or_else(|| config.title.clone()));
        debug!("Initializing AutoDoc for {} with default tag {}", config.title, default_tag.name);
        Self {
            config,
            default_tag,
            registry,
        }
    }

    pub fn config(&self) -> &AutoDocConfig {
        &self.config
    }

    pub fn registry(&self) -> &ResponseRegistry {
        &self.registry
    }

    /// A new, empty document seeded with the configured title, version and info
    pub fn start_spec(&self) -> SpecDocument {
        SpecDocument::new(
            self.config.title.clone(),
            self.config.app_version.clone(),
            self.config.openapi_version.clone(),
            self.config.info.clone(),
        )
    }

    /// Parameter fields of a handler: the explicit schema if one was given, otherwise one field
    /// per signature parameter, required unless it has a default.
    pub fn parameter_fields(doc: &RouteDoc) -> FieldMap {
        if let Some(fields) = &doc.parameter_schema {
            return fields.clone();
        }

        doc.signature
            .iter()
            .map(|param| {
                let options = FieldOptions {
                    required: param.default.is_none(),
                    default: param.default.clone(),
                    ..FieldOptions::default()
                };
                (param.name.clone(), synthesize(&param.type_info, options))
            })
            .collect()
    }

    /// Response content for a return annotation.
    ///
    /// `None` when the handler declares no return type (or returns None/`()`). A type the
    /// registry does not know is documented as an untyped `value` sent as plain text.
    pub fn response_content(&self, returns: &TypeInfo) -> Option<ResponseContent> {
        if let Some(descriptor) = self.registry.resolve(returns) {
            return Some(ResponseContent {
                content_type: descriptor
                    .mime_type()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string(),
                schema: descriptor.schema(),
            });
        }

        if classify(returns).shape == Shape::Empty {
            return None;
        }

        debug!("Falling back to plain text response for {}", returns);
        let mut fields = FieldMap::new();
        fields.insert(
            "value".to_string(),
            synthesize(
                returns,
                FieldOptions {
                    required: true,
                    ..FieldOptions::default()
                },
            ),
        );
        Some(ResponseContent {
            content_type: FALLBACK_CONTENT_TYPE.to_string(),
            schema: Schema::object(&fields),
        })
    }

    /// Register one documented route on `spec`, returning the same document for chaining
    pub fn register_path<'s>(
        &self,
        spec: &'s mut SpecDocument,
        path: &str,
        method: HttpMethod,
        status: u16,
        doc: &RouteDoc,
    ) -> &'s mut SpecDocument {
        debug!("Adding route: {} {}", method, path);

        let parameters = vec![Parameter {
            name: "query".to_string(),
            location: "query".to_string(),
            schema: Schema::object(&Self::parameter_fields(doc)),
        }];

        let mut responses = BTreeMap::new();
        if let Some(content) = self.response_content(&doc.returns) {
            let mut media = BTreeMap::new();
            media.insert(
                content.content_type,
                MediaType {
                    schema: content.schema,
                },
            );
            responses.insert(
                status.to_string(),
                Response {
                    description: status_reason(status).to_string(),
                    content: Some(media),
                },
            );
        }

        let tags = if doc.tags.is_empty() {
            vec![self.default_tag.clone()]
        } else {
            doc.tags.clone()
        };

        let operation = Operation {
            responses,
            parameters,
            summary: doc.summary.clone(),
            description: doc.description.clone(),
            tags,
        };

        spec.insert_operation(path, method, operation)
    }

    /// Build a fresh document covering every documented route of `app`
    pub fn aggregate<A: HostApplication + ?Sized>(&self, app: &A) -> SpecDocument {
        let mut spec = self.start_spec();
        self.aggregate_into(app, &mut spec);
        info!(
            "Documented {} operations across {} paths",
            spec.operation_count(),
            spec.paths().len()
        );
        spec
    }

    /// Add every documented route of `app` to an existing document
    pub fn aggregate_into<'s, A: HostApplication + ?Sized>(
        &self,
        app: &A,
        spec: &'s mut SpecDocument,
    ) -> &'s mut SpecDocument {
        let bare_doc = RouteDoc::default();

        for endpoint in app.endpoints() {
            let path = match app.url_for(&endpoint.name) {
                Some(path) => path,
                None => {
                    warn!("No URL for endpoint {}, skipping", endpoint.name);
                    continue;
                }
            };

            for method in endpoint.methods {
                if !self.config.documented_verbs.contains(&method) {
                    debug!("Verb {} of {} is not documented", method, endpoint.name);
                    continue;
                }

                if app.is_hidden(&endpoint.name, method) {
                    debug!("Skipping hidden handler {} {}", method, path);
                    continue;
                }

                let doc = match app.route_doc(&endpoint.name, method) {
                    Some(doc) => doc,
                    None if self.config.always_document => &bare_doc,
                    None => {
                        debug!("Skipping undocumented handler {} {}", method, path);
                        continue;
                    }
                };

                self.register_path(spec, &path, method, 200, doc);
            }
        }

        spec
    }
}

/// Reason phrase used as the response description
fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        _ => "Response",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responses::JSON_CONTENT_TYPE;
    use crate::routes::RouteTable;
    use crate::schema_generator::FieldNode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn auto_doc() -> AutoDoc {
        AutoDoc::new(AutoDocConfig::new("Test App").default_tag("Test Application"))
    }

    #[test]
    fn test_parameter_fields_prefers_explicit_schema() {
        let mut explicit = FieldMap::new();
        explicit.insert("foo".to_string(), FieldNode::string().required());
        explicit.insert("bar".to_string(), FieldNode::integer());

        let doc = RouteDoc::new()
            .parameter_schema(explicit.clone())
            .param("ignored", TypeInfo::named("bool"));

        assert_eq!(AutoDoc::parameter_fields(&doc), explicit);
    }

    #[test]
    fn test_parameter_fields_inferred_from_signature() {
        let doc = RouteDoc::new()
            .param("foo", TypeInfo::named("str"))
            .param_with_default("bar", TypeInfo::named("int"), json!(3));

        let fields = AutoDoc::parameter_fields(&doc);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["foo"], FieldNode::string().required());
        assert_eq!(fields["bar"], FieldNode::integer().with_default(json!(3)));
    }

    #[test]
    fn test_response_content_for_scalar() {
        let content = auto_doc().response_content(&TypeInfo::named("str")).unwrap();
        assert_eq!(content.content_type, TEXT_CONTENT_TYPE);
        let properties = content.schema.properties.unwrap();
        assert_eq!(properties["value"].schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_response_content_for_dict() {
        let content = auto_doc().response_content(&TypeInfo::named("Dict")).unwrap();
        assert_eq!(content.content_type, JSON_CONTENT_TYPE);
        assert!(content.schema.properties.unwrap().contains_key("response"));
    }

    #[test]
    fn test_response_content_absent_for_empty_annotation() {
        let doc = auto_doc();
        assert!(doc.response_content(&TypeInfo::empty()).is_none());
        assert!(doc.response_content(&TypeInfo::none()).is_none());
    }

    #[test]
    fn test_response_content_falls_back_to_text() {
        let content = auto_doc().response_content(&TypeInfo::named("User")).unwrap();
        assert_eq!(content.content_type, FALLBACK_CONTENT_TYPE);
        assert_eq!(content.schema.properties.unwrap()["value"], Schema::default());
    }

    #[test]
    fn test_register_path_default_tag_and_chaining() {
        let manual = Operation {
            responses: BTreeMap::new(),
            parameters: Vec::new(),
            summary: None,
            description: None,
            tags: Vec::new(),
        };

        let auto_doc = auto_doc();
        let mut spec = auto_doc.start_spec();
        auto_doc
            .register_path(&mut spec, "/a", HttpMethod::Get, 200, &RouteDoc::new())
            .insert_operation("/b", HttpMethod::Get, manual);

        let op = spec.operation("/a", HttpMethod::Get).unwrap();
        assert_eq!(op.tags, vec![Tag::new("Test Application")]);
        assert!(op.responses.is_empty());
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(op.parameters[0].location, "query");
        assert_eq!(spec.operation_count(), 2);
    }

    #[test]
    fn test_default_tag_falls_back_to_title() {
        let auto_doc = AutoDoc::new(AutoDocConfig::new("Plain App"));
        let mut spec = auto_doc.start_spec();
        auto_doc.register_path(&mut spec, "/x", HttpMethod::Post, 200, &RouteDoc::new());
        let op = spec.operation("/x", HttpMethod::Post).unwrap();
        assert_eq!(op.tags, vec![Tag::new("Plain App")]);
    }

    #[test]
    fn test_aggregate_skips_undocumented_and_unlisted_verbs() {
        let mut table = RouteTable::new();
        table
            .add_resource("/status", "Status")
            .unwrap()
            .documented(HttpMethod::Get, RouteDoc::new().summary("Status"))
            .route(HttpMethod::Post)
            .documented(HttpMethod::Head, RouteDoc::new());

        let spec = auto_doc().aggregate(&table);
        assert_eq!(spec.operation_count(), 1);
        assert!(spec.operation("/status", HttpMethod::Get).is_some());
        assert!(spec.operation("/status", HttpMethod::Post).is_none());
        assert!(spec.operation("/status", HttpMethod::Head).is_none());
    }

    #[test]
    fn test_always_document_includes_bare_handlers() {
        let mut table = RouteTable::new();
        table.add_resource("/flask/status/unlisted", "unlisted").unwrap().route(HttpMethod::Get);

        let auto_doc = AutoDoc::new(AutoDocConfig::new("App").always_document(true));
        let spec = auto_doc.aggregate(&table);
        let op = spec.operation("/flask/status/unlisted", HttpMethod::Get).unwrap();
        assert!(op.summary.is_none());
        assert!(op.responses.is_empty());
    }

    #[test]
    fn test_hidden_handlers_stay_out_with_always_document() {
        let mut table = RouteTable::new();
        table
            .add_resource("/secret", "Secret")
            .unwrap()
            .hidden(HttpMethod::Get)
            .route(HttpMethod::Post)
            .hidden(HttpMethod::Put);

        let auto_doc = AutoDoc::new(AutoDocConfig::new("App").always_document(true));
        let spec = auto_doc.aggregate(&table);

        assert_eq!(spec.operation_count(), 1);
        assert!(spec.operation("/secret", HttpMethod::Get).is_none());
        assert!(spec.operation("/secret", HttpMethod::Put).is_none());
        assert!(spec.operation("/secret", HttpMethod::Post).is_some());
    }

    #[test]
    fn test_aggregate_into_extends_existing_document() {
        let mut table = RouteTable::new();
        table
            .add_resource("/users/<int:id>", "User")
            .unwrap()
            .documented(HttpMethod::Get, RouteDoc::new().returns(TypeInfo::named("Dict")));

        let auto_doc = auto_doc();
        let mut spec = auto_doc.start_spec();
        auto_doc.register_path(&mut spec, "/manual", HttpMethod::Get, 200, &RouteDoc::new());
        auto_doc.aggregate_into(&table, &mut spec);

        assert_eq!(spec.operation_count(), 2);
        assert!(spec.operation("/users/{id}", HttpMethod::Get).is_some());
    }
}
