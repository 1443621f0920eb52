use crate::routes::ParameterLocation;
use crate::type_classifier::{classify, ScalarKind, Shape};
use crate::type_info::TypeInfo;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named schema fields, ordered by name
pub type FieldMap = BTreeMap<String, FieldNode>;

/// One node of a schema field tree
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    /// What the field holds, including its children
    pub kind: FieldKind,
    /// Free-form metadata carried onto the rendered schema
    pub options: FieldOptions,
}

/// Field kinds the synthesizer produces
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Boolean,
    Integer,
    Float,
    String,
    /// Homogeneous list with a single element field
    List(Box<FieldNode>),
    /// Mapping with key and value fields
    Dict {
        keys: Box<FieldNode>,
        values: Box<FieldNode>,
    },
    /// Untyped value
    Raw,
    /// Untyped value standing in for a union of several types
    Mixed,
}

/// Metadata attached to a field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    /// Whether the field must be present
    pub required: bool,
    /// Field description
    pub description: Option<String>,
    /// Documented default value
    pub default: Option<Value>,
    /// Where a parameter field is read from
    pub location: Option<ParameterLocation>,
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Schema description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Documented default value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    /// Required field names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Value schema for mapping types
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,
    /// Where a parameter field is read from
    #[serde(rename = "x-location", skip_serializing_if = "Option::is_none")]
    pub location: Option<ParameterLocation>,
}

impl FieldNode {
    /// Create a field of the given kind with default options
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            options: FieldOptions::default(),
        }
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    pub fn float() -> Self {
        Self::new(FieldKind::Float)
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn raw() -> Self {
        Self::new(FieldKind::Raw)
    }

    pub fn list(inner: FieldNode) -> Self {
        Self::new(FieldKind::List(Box::new(inner)))
    }

    pub fn dict(keys: FieldNode, values: FieldNode) -> Self {
        Self::new(FieldKind::Dict {
            keys: Box::new(keys),
            values: Box::new(values),
        })
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.options.required = true;
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.options.description = Some(description.into());
        self
    }

    /// Attach a documented default value
    pub fn with_default(mut self, default: Value) -> Self {
        self.options.default = Some(default);
        self
    }

    /// Record where the field is read from
    pub fn at(mut self, location: ParameterLocation) -> Self {
        self.options.location = Some(location);
        self
    }

    /// Replace all options at once
    pub fn with_options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether the field carries no type information (raw or mixed)
    pub fn is_opaque(&self) -> bool {
        matches!(self.kind, FieldKind::Raw | FieldKind::Mixed)
    }

    /// The single element field of a list
    pub fn inner(&self) -> Option<&FieldNode> {
        match &self.kind {
            FieldKind::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Key and value fields of a mapping
    pub fn key_value(&self) -> Option<(&FieldNode, &FieldNode)> {
        match &self.kind {
            FieldKind::Dict { keys, values } => Some((keys, values)),
            _ => None,
        }
    }

    /// Description metadata, if any
    pub fn description(&self) -> Option<&str> {
        self.options.description.as_deref()
    }

    /// Render this field as an OpenAPI schema
    pub fn to_schema(&self) -> Schema {
        let mut schema = match &self.kind {
            FieldKind::Boolean => Schema::of_type("boolean"),
            FieldKind::Integer => Schema::of_type("integer"),
            FieldKind::Float => Schema::of_type("number"),
            FieldKind::String => Schema::of_type("string"),
            FieldKind::List(inner) => Schema {
                items: Some(Box::new(inner.to_schema())),
                ..Schema::of_type("array")
            },
            // OpenAPI object keys are always strings, so only the value field is rendered
            FieldKind::Dict { values, .. } => Schema {
                additional_properties: Some(Box::new(values.to_schema())),
                ..Schema::of_type("object")
            },
            FieldKind::Raw | FieldKind::Mixed => Schema::default(),
        };

        schema.description = self.options.description.clone();
        schema.default = self.options.default.clone();
        schema.location = self.options.location;
        schema
    }
}

impl Schema {
    fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    /// Render a set of named fields as an object schema
    pub fn object(fields: &FieldMap) -> Self {
        let properties: BTreeMap<String, Schema> = fields
            .iter()
            .map(|(name, field)| (name.clone(), field.to_schema()))
            .collect();

        let required: Vec<String> = fields
            .iter()
            .filter(|(_, field)| field.options.required)
            .map(|(name, _)| name.clone())
            .collect();

        Self {
            properties: Some(properties),
            required: if required.is_empty() {
                None
            } else {
                Some(required)
            },
            ..Self::of_type("object")
        }
    }
}

/// Synthesize a field for a type descriptor with default options
pub fn synthesize_type(type_info: &TypeInfo) -> FieldNode {
    synthesize(type_info, FieldOptions::default())
}

/// Convert a type descriptor into a field tree.
///
/// Options apply to the outermost field only; children are synthesized with defaults. For
/// unions and tuples the description derived from the member types replaces any description
/// passed in.
pub fn synthesize(type_info: &TypeInfo, mut options: FieldOptions) -> FieldNode {
    let classification = classify(type_info);
    debug!(
        "Synthesizing field for {} as {:?}",
        type_info, classification.shape
    );

    if let Some(description) = classification.description() {
        options.description = Some(description);
    }

    let kind = match classification.shape {
        Shape::Scalar(ScalarKind::Boolean) => FieldKind::Boolean,
        Shape::Scalar(ScalarKind::Integer) => FieldKind::Integer,
        Shape::Scalar(ScalarKind::Float) => FieldKind::Float,
        Shape::Scalar(ScalarKind::String) => FieldKind::String,
        Shape::List => {
            let element = classification.inner.first().cloned().unwrap_or_else(TypeInfo::any);
            FieldKind::List(Box::new(synthesize_type(&element)))
        }
        Shape::Mapping => {
            let mut inner = classification.inner.iter();
            let keys = inner.next().map(synthesize_type).unwrap_or_else(FieldNode::raw);
            let values = inner.next().map(synthesize_type).unwrap_or_else(FieldNode::raw);
            FieldKind::Dict {
                keys: Box::new(keys),
                values: Box::new(values),
            }
        }
        // Tuples are documented as lists of untyped members
        Shape::Tuple => FieldKind::List(Box::new(FieldNode::raw())),
        Shape::Union => FieldKind::Mixed,
        Shape::Any | Shape::Empty | Shape::Unknown => FieldKind::Raw,
    };

    FieldNode { kind, options }
}
