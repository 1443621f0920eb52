//! Response object registry.
//!
//! Maps a handler's return annotation to a [`ResponseDescriptor`]: the schema of the response
//! body and the content type it is sent with. The registry is built once, frozen, and handed to
//! the aggregator. Lookups try, in order:
//!
//! 1. an exact match on the whole type descriptor
//! 2. the type's base name, first as written and then lowercased
//! 3. the shape category the classifier derives for the type
//! 4. the caller-supplied default
//!
//! A `None` result means the route documents no response body. That is the expected outcome
//! for a missing annotation, the None type or `()`.

use crate::schema_generator::{FieldMap, FieldNode, Schema};
use crate::type_classifier::{classify, ScalarKind, Shape};
use crate::type_info::TypeInfo;
use log::debug;
use std::collections::HashMap;
use std::fmt;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// Canonical response kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Value,
    Json,
    Dict,
    List,
    Tuple,
    String,
    Integer,
    Float,
    Boolean,
    /// A kind registered by the embedding application
    Custom(String),
}

impl ResponseKind {
    /// Name of the response wrapper, also accepted as an alias when resolving
    pub fn name(&self) -> &str {
        match self {
            ResponseKind::Value => "ValueResponse",
            ResponseKind::Json => "JSONResponse",
            ResponseKind::Dict => "DictResponse",
            ResponseKind::List => "ListResponse",
            ResponseKind::Tuple => "TupleResponse",
            ResponseKind::String => "StringResponse",
            ResponseKind::Integer => "IntegerResponse",
            ResponseKind::Float => "FloatResponse",
            ResponseKind::Boolean => "BooleanResponse",
            ResponseKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declarative description of a response body
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDescriptor {
    kind: ResponseKind,
    fields: FieldMap,
    content_type: Option<String>,
}

impl ResponseDescriptor {
    pub fn new(kind: ResponseKind) -> Self {
        Self {
            kind,
            fields: FieldMap::new(),
            content_type: None,
        }
    }

    pub fn field(mut self, name: impl Into<String>, field: FieldNode) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn kind(&self) -> &ResponseKind {
        &self.kind
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Content type the body is sent with, if the descriptor declares one
    pub fn mime_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Object schema of the response body
    pub fn schema(&self) -> Schema {
        Schema::object(&self.fields)
    }
}

/// Frozen lookup table from response kinds to descriptors
#[derive(Debug, Clone)]
pub struct ResponseRegistry {
    descriptors: Vec<ResponseDescriptor>,
    by_type: HashMap<TypeInfo, usize>,
    by_name: HashMap<String, usize>,
    by_lowercase_name: HashMap<String, usize>,
    by_shape: HashMap<Shape, usize>,
}

/// Builder collecting descriptors before the registry is frozen
#[derive(Debug, Clone, Default)]
pub struct ResponseRegistryBuilder {
    descriptors: Vec<ResponseDescriptor>,
    types: Vec<(TypeInfo, ResponseKind)>,
    names: Vec<(String, ResponseKind)>,
    shapes: Vec<(Shape, ResponseKind)>,
}

impl ResponseRegistryBuilder {
    /// Add a descriptor, replacing any earlier one of the same kind.
    /// The kind's wrapper name becomes an alias automatically.
    pub fn register(mut self, descriptor: ResponseDescriptor) -> Self {
        let name = descriptor.kind.name().to_string();
        let kind = descriptor.kind.clone();
        match self.descriptors.iter_mut().find(|d| d.kind == descriptor.kind) {
            Some(existing) => *existing = descriptor,
            None => self.descriptors.push(descriptor),
        }
        self.names.push((name, kind));
        self
    }

    /// Resolve `name` (and its lowercase form) to `kind`
    pub fn alias(mut self, name: impl Into<String>, kind: ResponseKind) -> Self {
        self.names.push((name.into(), kind));
        self
    }

    /// Resolve the exact type descriptor `type_info` to `kind`
    pub fn bind_type(mut self, type_info: TypeInfo, kind: ResponseKind) -> Self {
        self.types.push((type_info, kind));
        self
    }

    /// Resolve every type of the given shape to `kind`
    pub fn bind_shape(mut self, shape: Shape, kind: ResponseKind) -> Self {
        self.shapes.push((shape, kind));
        self
    }

    /// Freeze the registry. Bindings to kinds that were never registered are dropped.
    pub fn build(self) -> ResponseRegistry {
        let index_of = |kind: &ResponseKind| self.descriptors.iter().position(|d| &d.kind == kind);

        let mut by_type = HashMap::new();
        for (type_info, kind) in &self.types {
            if let Some(index) = index_of(kind) {
                by_type.insert(type_info.clone(), index);
            }
        }

        let mut by_name = HashMap::new();
        let mut by_lowercase_name = HashMap::new();
        for (name, kind) in &self.names {
            if let Some(index) = index_of(kind) {
                by_name.insert(name.clone(), index);
                by_lowercase_name.entry(name.to_lowercase()).or_insert(index);
            }
        }

        let mut by_shape = HashMap::new();
        for (shape, kind) in &self.shapes {
            if let Some(index) = index_of(kind) {
                by_shape.insert(*shape, index);
            }
        }

        debug!(
            "Built response registry with {} descriptors and {} aliases",
            self.descriptors.len(),
            by_name.len()
        );

        ResponseRegistry {
            descriptors: self.descriptors,
            by_type,
            by_name,
            by_lowercase_name,
            by_shape,
        }
    }
}

impl ResponseRegistry {
    pub fn builder() -> ResponseRegistryBuilder {
        ResponseRegistryBuilder::default()
    }

    /// The built-in response kinds.
    pub fn standard() -> Self {
        Self::standard_builder().build()
    }

    /// Builder pre-loaded with the built-in kinds, for registries that extend them.
    pub fn standard_builder() -> ResponseRegistryBuilder {
        use ResponseKind::*;

        let value_field = |description: &str| FieldNode::raw().required().with_description(description);

        Self::builder()
            .register(
                ResponseDescriptor::new(Value)
                    .field(
                        "value",
                        value_field(
                            "General value field, can hold an Integer, Float, String, Boolean, Dictionary, or List",
                        ),
                    )
                    .content_type(JSON_CONTENT_TYPE),
            )
            .register(
                ResponseDescriptor::new(Json)
                    .field("value", value_field("JSON response field"))
                    .content_type(JSON_CONTENT_TYPE),
            )
            .register(
                ResponseDescriptor::new(Dict)
                    .field(
                        "response",
                        FieldNode::dict(FieldNode::raw(), FieldNode::raw())
                            .required()
                            .with_description("Object response field"),
                    )
                    .content_type(JSON_CONTENT_TYPE),
            )
            .register(
                ResponseDescriptor::new(List)
                    .field(
                        "value",
                        FieldNode::list(FieldNode::raw())
                            .required()
                            .with_description("List response field"),
                    )
                    .content_type(JSON_CONTENT_TYPE),
            )
            .register(
                ResponseDescriptor::new(Tuple)
                    .field(
                        "value",
                        FieldNode::list(FieldNode::raw())
                            .required()
                            .with_description("Tuple response field"),
                    )
                    .content_type(TEXT_CONTENT_TYPE),
            )
            .register(
                ResponseDescriptor::new(String)
                    .field(
                        "value",
                        FieldNode::string().required().with_description("String response field"),
                    )
                    .content_type(TEXT_CONTENT_TYPE),
            )
            .register(
                ResponseDescriptor::new(Integer)
                    .field(
                        "value",
                        FieldNode::integer().required().with_description("Integer response field"),
                    )
                    .content_type(TEXT_CONTENT_TYPE),
            )
            .register(
                ResponseDescriptor::new(Float)
                    .field(
                        "value",
                        FieldNode::float().required().with_description("Float response field"),
                    )
                    .content_type(TEXT_CONTENT_TYPE),
            )
            .register(
                ResponseDescriptor::new(Boolean)
                    .field(
                        "value",
                        FieldNode::boolean().required().with_description("Boolean response field"),
                    )
                    .content_type(TEXT_CONTENT_TYPE),
            )
            .bind_type(TypeInfo::any(), Value)
            .alias("Any", Value)
            .alias("JsonResponse", Json)
            .bind_type(TypeInfo::named("dict"), Dict)
            .bind_type(TypeInfo::named("Dict"), Dict)
            .alias("dict", Dict)
            .alias("Dict", Dict)
            .bind_type(TypeInfo::named("list"), List)
            .bind_type(TypeInfo::named("List"), List)
            .alias("list", List)
            .alias("List", List)
            .bind_type(TypeInfo::named("tuple"), Tuple)
            .bind_type(TypeInfo::named("Tuple"), Tuple)
            .alias("tuple", Tuple)
            .alias("Tuple", Tuple)
            .bind_type(TypeInfo::named("str"), String)
            .alias("str", String)
            .alias("String", String)
            .bind_type(TypeInfo::named("int"), Integer)
            .alias("int", Integer)
            .alias("Integer", Integer)
            .bind_type(TypeInfo::named("float"), Float)
            .alias("float", Float)
            .bind_type(TypeInfo::named("bool"), Boolean)
            .alias("bool", Boolean)
            .alias("Boolean", Boolean)
            .bind_shape(Shape::Any, Value)
            .bind_shape(Shape::Union, Value)
            .bind_shape(Shape::Mapping, Dict)
            .bind_shape(Shape::List, List)
            .bind_shape(Shape::Tuple, Tuple)
            .bind_shape(Shape::Scalar(ScalarKind::String), String)
            .bind_shape(Shape::Scalar(ScalarKind::Integer), Integer)
            .bind_shape(Shape::Scalar(ScalarKind::Float), Float)
            .bind_shape(Shape::Scalar(ScalarKind::Boolean), Boolean)
    }

    /// Resolve a return annotation to its descriptor
    pub fn resolve(&self, type_info: &TypeInfo) -> Option<&ResponseDescriptor> {
        self.resolve_or(type_info, None)
    }

    /// Resolve a return annotation, falling back to `default` when nothing matches
    pub fn resolve_or<'a>(
        &'a self,
        type_info: &TypeInfo,
        default: Option<&'a ResponseDescriptor>,
    ) -> Option<&'a ResponseDescriptor> {
        let index = self
            .by_type
            .get(type_info)
            .or_else(|| self.by_name.get(type_info.base_name()))
            .or_else(|| self.by_lowercase_name.get(&type_info.base_name().to_lowercase()))
            .or_else(|| self.by_shape.get(&classify(type_info).shape));

        match index {
            Some(&index) => {
                let descriptor = &self.descriptors[index];
                debug!("Resolved response type {} to {}", type_info, descriptor.kind);
                Some(descriptor)
            }
            None => {
                debug!("No response descriptor for type {:?}", type_info.to_string());
                default
            }
        }
    }

    /// Resolve a textual annotation or wrapper name
    pub fn resolve_name(&self, name: &str) -> Option<&ResponseDescriptor> {
        self.resolve(&TypeInfo::parse(name))
    }

    /// Descriptor registered for `kind`
    pub fn get(&self, kind: &ResponseKind) -> Option<&ResponseDescriptor> {
        self.descriptors.iter().find(|d| &d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for ResponseRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_generator::FieldKind;
    use pretty_assertions::assert_eq;

    fn resolved_kind(registry: &ResponseRegistry, annotation: &str) -> Option<ResponseKind> {
        registry.resolve_name(annotation).map(|d| d.kind().clone())
    }

    #[test]
    fn test_raw_type_and_names_resolve_to_same_descriptor() {
        let registry = ResponseRegistry::standard();
        let cases = [
            ("str", "Str", ResponseKind::String),
            ("int", "Int", ResponseKind::Integer),
            ("float", "Float", ResponseKind::Float),
            ("bool", "Bool", ResponseKind::Boolean),
            ("dict", "Dict", ResponseKind::Dict),
            ("list", "List", ResponseKind::List),
            ("tuple", "Tuple", ResponseKind::Tuple),
        ];

        for (lower, capitalized, kind) in cases {
            let expected = registry.get(&kind).unwrap();
            let by_type = registry.resolve(&TypeInfo::named(lower)).unwrap();
            let by_lower = registry.resolve_name(lower).unwrap();
            let by_capitalized = registry.resolve_name(capitalized).unwrap();

            assert!(std::ptr::eq(expected, by_type), "{} by type", lower);
            assert!(std::ptr::eq(expected, by_lower), "{} by name", lower);
            assert!(std::ptr::eq(expected, by_capitalized), "{} by name", capitalized);
        }
    }

    #[test]
    fn test_parameterised_types_resolve_by_name() {
        let registry = ResponseRegistry::standard();
        assert_eq!(resolved_kind(&registry, "Dict[str, int]"), Some(ResponseKind::Dict));
        assert_eq!(resolved_kind(&registry, "typing.List[str]"), Some(ResponseKind::List));
        assert_eq!(resolved_kind(&registry, "Tuple[str, bool]"), Some(ResponseKind::Tuple));
    }

    #[test]
    fn test_resolve_by_shape() {
        let registry = ResponseRegistry::standard();
        assert_eq!(resolved_kind(&registry, "Vec<User>"), Some(ResponseKind::List));
        assert_eq!(resolved_kind(&registry, "HashMap<String, i32>"), Some(ResponseKind::Dict));
        assert_eq!(resolved_kind(&registry, "Optional[int]"), Some(ResponseKind::Integer));
        assert_eq!(resolved_kind(&registry, "u64"), Some(ResponseKind::Integer));
        assert_eq!(resolved_kind(&registry, "Union[int, str]"), Some(ResponseKind::Value));
        assert_eq!(resolved_kind(&registry, "serde_json::Value"), Some(ResponseKind::Value));
    }

    #[test]
    fn test_wrapper_names_resolve() {
        let registry = ResponseRegistry::standard();
        assert_eq!(resolved_kind(&registry, "JSONResponse"), Some(ResponseKind::Json));
        assert_eq!(resolved_kind(&registry, "ValueResponse"), Some(ResponseKind::Value));
        assert_eq!(resolved_kind(&registry, "IntegerResponse"), Some(ResponseKind::Integer));
        assert_eq!(resolved_kind(&registry, "Any"), Some(ResponseKind::Value));
    }

    #[test]
    fn test_empty_annotation_resolves_to_none() {
        let registry = ResponseRegistry::standard();
        assert!(registry.resolve(&TypeInfo::empty()).is_none());
        assert!(registry.resolve_name("None").is_none());
        assert!(registry.resolve_name("()").is_none());
        assert!(registry.resolve_name("User").is_none());
    }

    #[test]
    fn test_default_used_when_nothing_matches() {
        let registry = ResponseRegistry::standard();
        let fallback = registry.get(&ResponseKind::Json);
        let resolved = registry.resolve_or(&TypeInfo::named("User"), fallback).unwrap();
        assert_eq!(resolved.kind(), &ResponseKind::Json);
    }

    #[test]
    fn test_field_naming_and_content_types() {
        let registry = ResponseRegistry::standard();

        let dict = registry.get(&ResponseKind::Dict).unwrap();
        assert!(dict.fields().contains_key("response"));
        assert_eq!(dict.mime_type(), Some(JSON_CONTENT_TYPE));

        let integer = registry.get(&ResponseKind::Integer).unwrap();
        assert_eq!(integer.fields()["value"].kind, FieldKind::Integer);
        assert_eq!(integer.mime_type(), Some(TEXT_CONTENT_TYPE));

        let tuple = registry.get(&ResponseKind::Tuple).unwrap();
        assert_eq!(tuple.mime_type(), Some(TEXT_CONTENT_TYPE));

        let list = registry.get(&ResponseKind::List).unwrap();
        assert_eq!(list.mime_type(), Some(JSON_CONTENT_TYPE));
    }

    #[test]
    fn test_custom_kind_registration() {
        let custom = ResponseKind::Custom("CsvResponse".to_string());
        let registry = ResponseRegistry::standard_builder()
            .register(ResponseDescriptor::new(custom.clone()).field("value", FieldNode::string()))
            .alias("csv", custom.clone())
            .build();

        let by_alias = registry.resolve_name("CSV").unwrap();
        assert_eq!(by_alias.kind(), &custom);
        assert_eq!(by_alias.mime_type(), None);
        assert!(std::ptr::eq(by_alias, registry.resolve_name("CsvResponse").unwrap()));
    }
}
