//! Route metadata and the host application seam.
//!
//! Documentation is opt-in: a handler appears in the generated document only when a [`RouteDoc`]
//! has been attached to it. A handler can also be hidden, which keeps it out of the document
//! even when undocumented handlers are included. The metadata is built explicitly when routes are registered and is
//! read-only afterwards.
//!
//! The aggregator never talks to a web framework directly. It consumes the
//! [`HostApplication`] trait, which [`RouteTable`] implements for applications that describe
//! their routes up front (or load them from manifests, see [`crate::manifest`]).
//!
//! # Example
//!
//! ```
//! use openapi_from_routes::routes::{HttpMethod, RouteDoc, RouteTable};
//! use openapi_from_routes::type_info::TypeInfo;
//!
//! let mut table = RouteTable::new();
//! table
//!     .add_resource("/math/add", "AddTwo_math")
//!     .unwrap()
//!     .documented(
//!         HttpMethod::Get,
//!         RouteDoc::new()
//!             .summary("Add Endpoint")
//!             .param("first_number", TypeInfo::named("float"))
//!             .param("second_number", TypeInfo::named("float"))
//!             .returns(TypeInfo::named("float")),
//!     );
//! ```

use crate::error::{Error, Result};
use crate::schema_generator::{synthesize, FieldMap, FieldNode, FieldOptions};
use crate::type_info::TypeInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// HTTP methods a handler can be registered for.
///
/// The declaration order is the enumeration order used when a resource's handlers are walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// All methods, in enumeration order
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    /// Lowercase method name as used for OpenAPI operation keys
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown HTTP method: {}", s)))
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

/// The location where a parameter value is read from in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Query string parameter (e.g., `?page=1&limit=10`)
    #[default]
    Query,
    /// Field of a JSON request body
    Json,
    /// Form-encoded body field
    Form,
    /// HTTP header parameter
    Header,
    /// Path parameter embedded in the URL (e.g., `/users/{id}`)
    Path,
}

/// Tag used to group operations in the rendered documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Declared configuration of one handler parameter.
///
/// Each parameter states its own source location instead of relying on whatever argument
/// parser the handler uses at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub type_info: TypeInfo,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: Option<String>,
    pub default: Option<Value>,
}

impl ParameterSpec {
    /// A query parameter that is not required
    pub fn new(name: impl Into<String>, type_info: TypeInfo) -> Self {
        Self {
            name: name.into(),
            type_info,
            location: ParameterLocation::Query,
            required: false,
            description: None,
            default: None,
        }
    }

    pub fn location(mut self, location: ParameterLocation) -> Self {
        self.location = location;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Synthesize the schema field for this parameter
    pub fn to_field(&self) -> FieldNode {
        synthesize(
            &self.type_info,
            FieldOptions {
                required: self.required,
                description: self.description.clone(),
                default: self.default.clone(),
                location: Some(self.location),
            },
        )
    }
}

/// One parameter of a handler's signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureParam {
    pub name: String,
    pub type_info: TypeInfo,
    /// Default value; a parameter without one is required
    pub default: Option<Value>,
}

/// Documentation metadata attached to a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteDoc {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<Tag>,
    /// Explicit parameter schema; when present the signature is not inspected
    pub parameter_schema: Option<FieldMap>,
    /// Handler signature used to infer parameters
    pub signature: Vec<SignatureParam>,
    /// Return annotation; empty when the handler declares none
    pub returns: TypeInfo,
}

impl RouteDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::new(name));
        self
    }

    /// Replace the explicit parameter schema
    pub fn parameter_schema(mut self, fields: FieldMap) -> Self {
        self.parameter_schema = Some(fields);
        self
    }

    /// Add one explicitly configured parameter to the parameter schema
    pub fn parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameter_schema
            .get_or_insert_with(FieldMap::new)
            .insert(spec.name.clone(), spec.to_field());
        self
    }

    /// Add a signature parameter without a default
    pub fn param(mut self, name: impl Into<String>, type_info: TypeInfo) -> Self {
        self.signature.push(SignatureParam {
            name: name.into(),
            type_info,
            default: None,
        });
        self
    }

    /// Add a signature parameter with a default value
    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        type_info: TypeInfo,
        default: Value,
    ) -> Self {
        self.signature.push(SignatureParam {
            name: name.into(),
            type_info,
            default: Some(default),
        });
        self
    }

    pub fn returns(mut self, type_info: TypeInfo) -> Self {
        self.returns = type_info;
        self
    }
}

/// An endpoint exposed by a host application and the verbs it serves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub methods: Vec<HttpMethod>,
}

/// What the aggregator needs from the application being documented.
pub trait HostApplication {
    /// Every endpoint, in a stable order
    fn endpoints(&self) -> Vec<Endpoint>;

    /// Path template an endpoint is mounted at
    fn url_for(&self, endpoint: &str) -> Option<String>;

    /// Documentation attached to the handler of `endpoint` for `method`, if any
    fn route_doc(&self, endpoint: &str, method: HttpMethod) -> Option<&RouteDoc>;

    /// Whether the handler was explicitly hidden from documentation. Hidden handlers stay out
    /// of the document even when undocumented handlers are being included.
    fn is_hidden(&self, _endpoint: &str, _method: HttpMethod) -> bool {
        false
    }
}

/// Documentation state of one registered handler
#[derive(Debug, Clone, PartialEq)]
enum Handler {
    Undocumented,
    Documented(RouteDoc),
    Hidden,
}

/// A resource mounted at one path, with one handler per verb.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub endpoint: String,
    pub path: String,
    handlers: BTreeMap<HttpMethod, Handler>,
}

impl Resource {
    /// Register an undocumented handler
    pub fn route(&mut self, method: HttpMethod) -> &mut Self {
        self.handlers.insert(method, Handler::Undocumented);
        self
    }

    /// Register a handler with documentation attached
    pub fn documented(&mut self, method: HttpMethod, doc: RouteDoc) -> &mut Self {
        self.handlers.insert(method, Handler::Documented(doc));
        self
    }

    /// Register a handler that never appears in the document
    pub fn hidden(&mut self, method: HttpMethod) -> &mut Self {
        self.handlers.insert(method, Handler::Hidden);
        self
    }

    pub fn methods(&self) -> Vec<HttpMethod> {
        self.handlers.keys().copied().collect()
    }
}

/// Route table kept in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteTable {
    resources: Vec<Resource>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a new resource. Endpoint names must be unique.
    pub fn add_resource(
        &mut self,
        path: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<&mut Resource> {
        let endpoint = endpoint.into();
        if self.resources.iter().any(|r| r.endpoint == endpoint) {
            return Err(Error::DuplicateEndpoint(endpoint));
        }

        self.resources.push(Resource {
            endpoint,
            path: path.into(),
            handlers: BTreeMap::new(),
        });
        let index = self.resources.len() - 1;
        Ok(&mut self.resources[index])
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn find(&self, endpoint: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.endpoint == endpoint)
    }
}

impl HostApplication for RouteTable {
    fn endpoints(&self) -> Vec<Endpoint> {
        self.resources
            .iter()
            .map(|resource| Endpoint {
                name: resource.endpoint.clone(),
                methods: resource.methods(),
            })
            .collect()
    }

    fn url_for(&self, endpoint: &str) -> Option<String> {
        self.find(endpoint).map(|r| r.path.clone())
    }

    fn route_doc(&self, endpoint: &str, method: HttpMethod) -> Option<&RouteDoc> {
        match self.find(endpoint)?.handlers.get(&method)? {
            Handler::Documented(doc) => Some(doc),
            Handler::Undocumented | Handler::Hidden => None,
        }
    }

    fn is_hidden(&self, endpoint: &str, method: HttpMethod) -> bool {
        self.find(endpoint)
            .and_then(|resource| resource.handlers.get(&method))
            .map(|handler| matches!(handler, Handler::Hidden))
            .unwrap_or(false)
    }
}
