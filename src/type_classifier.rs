//! Shape classification of type descriptors.
//!
//! [`classify`] maps a [`TypeInfo`] onto a small closed set of shapes and pulls out the inner
//! descriptors the field synthesizer recurses into. Recognition is by base name against static
//! tables, in this order: scalar, list-like, mapping-like, tuple-like, union-like, the `Any`
//! sentinel, and finally unknown. Missing or malformed generic arguments never fail; each
//! missing position is filled with `Any`.

use crate::type_info::{TypeInfo, UNIT_NAME};
use log::debug;

/// Label prefixed to the description of a true union.
pub const UNION_LABEL: &str = "Multiple Types Allowed: ";
/// Label prefixed to the description of a tuple.
pub const TUPLE_LABEL: &str = "Tuple of types ";

const BOOLEAN_NAMES: &[&str] = &["bool", "Bool", "Boolean"];
const INTEGER_NAMES: &[&str] = &[
    "int", "Int", "Integer", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize",
];
const FLOAT_NAMES: &[&str] = &["float", "Float", "f32", "f64"];
const STRING_NAMES: &[&str] = &["str", "Str", "String", "Text", "AnyStr", "char"];
const LIST_NAMES: &[&str] = &[
    "list", "List", "Sequence", "Vec", "VecDeque", "set", "Set", "HashSet", "BTreeSet",
];
const MAPPING_NAMES: &[&str] = &["dict", "Dict", "Mapping", "HashMap", "BTreeMap"];
const TUPLE_NAMES: &[&str] = &["tuple", "Tuple"];
const UNION_NAMES: &[&str] = &["Union"];
const OPTIONAL_NAMES: &[&str] = &["Optional", "Option"];
const NONE_NAMES: &[&str] = &["None", "NoneType"];
const ANY_NAMES: &[&str] = &["Any", "Value", "object"];

/// Primitive kinds a scalar descriptor can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Boolean,
    Integer,
    Float,
    String,
}

impl ScalarKind {
    /// Looks a base name up in the scalar tables.
    pub fn from_name(name: &str) -> Option<Self> {
        if BOOLEAN_NAMES.contains(&name) {
            Some(ScalarKind::Boolean)
        } else if INTEGER_NAMES.contains(&name) {
            Some(ScalarKind::Integer)
        } else if FLOAT_NAMES.contains(&name) {
            Some(ScalarKind::Float)
        } else if STRING_NAMES.contains(&name) {
            Some(ScalarKind::String)
        } else {
            None
        }
    }
}

/// Shape category of a type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar(ScalarKind),
    List,
    Mapping,
    Tuple,
    /// A union with more than one non-None member
    Union,
    /// The explicit `Any` sentinel
    Any,
    /// No annotation, the None type, or `()`
    Empty,
    /// Anything the tables do not recognise
    Unknown,
}

/// Result of classifying a descriptor: its shape plus the inner descriptors to recurse into.
///
/// - List: exactly one element type
/// - Mapping: exactly two (key, value)
/// - Tuple and Union: every member, in declaration order
/// - everything else: none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub shape: Shape,
    pub inner: Vec<TypeInfo>,
}

impl Classification {
    fn leaf(shape: Shape) -> Self {
        Self {
            shape,
            inner: Vec::new(),
        }
    }

    /// Human-readable description for unions and tuples, `None` for every other shape.
    pub fn description(&self) -> Option<String> {
        match self.shape {
            Shape::Union => Some(format!("{}{}", UNION_LABEL, join_members(&self.inner))),
            Shape::Tuple => Some(format!("{}({})", TUPLE_LABEL, join_members(&self.inner))),
            _ => None,
        }
    }
}

fn join_members(members: &[TypeInfo]) -> String {
    members
        .iter()
        .map(|member| member.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether the descriptor names the None type.
pub fn is_none_type(type_info: &TypeInfo) -> bool {
    type_info.generic_args.is_empty() && NONE_NAMES.contains(&type_info.base_name())
}

/// Classifies a descriptor into its shape and inner descriptors.
pub fn classify(type_info: &TypeInfo) -> Classification {
    if type_info.is_empty() {
        return Classification::leaf(Shape::Empty);
    }

    let name = type_info.base_name();

    if let Some(kind) = ScalarKind::from_name(name) {
        return Classification::leaf(Shape::Scalar(kind));
    }

    if LIST_NAMES.contains(&name) {
        return Classification {
            shape: Shape::List,
            inner: vec![arg_or_any(type_info, 0)],
        };
    }

    if MAPPING_NAMES.contains(&name) {
        return Classification {
            shape: Shape::Mapping,
            inner: vec![arg_or_any(type_info, 0), arg_or_any(type_info, 1)],
        };
    }

    if TUPLE_NAMES.contains(&name) {
        return Classification {
            shape: Shape::Tuple,
            inner: type_info.generic_args.clone(),
        };
    }

    if is_union_like(type_info) {
        let mut members = Vec::new();
        flatten_union(type_info, &mut members);
        return classify_union(members);
    }

    if ANY_NAMES.contains(&name) {
        return Classification::leaf(Shape::Any);
    }

    if is_none_type(type_info) || type_info.name == UNIT_NAME {
        return Classification::leaf(Shape::Empty);
    }

    debug!("Unrecognised type {}, treating as opaque", type_info);
    Classification::leaf(Shape::Unknown)
}

fn is_union_like(type_info: &TypeInfo) -> bool {
    let name = type_info.base_name();
    UNION_NAMES.contains(&name) || OPTIONAL_NAMES.contains(&name)
}

/// Expand nested `Union`/`Optional` members into one flat list, in declaration order and
/// without repeats. `Optional[X]` contributes `X` and `None`.
fn flatten_union(type_info: &TypeInfo, members: &mut Vec<TypeInfo>) {
    let args: &[TypeInfo] = if OPTIONAL_NAMES.contains(&type_info.base_name()) {
        &type_info.generic_args[..type_info.generic_args.len().min(1)]
    } else {
        &type_info.generic_args
    };

    for arg in args {
        if is_union_like(arg) {
            flatten_union(arg, members);
        } else if !members.contains(arg) {
            members.push(arg.clone());
        }
    }

    if OPTIONAL_NAMES.contains(&type_info.base_name()) {
        let none = TypeInfo::none();
        if !members.iter().any(is_none_type) {
            members.push(none);
        }
    }
}

fn classify_union(members: Vec<TypeInfo>) -> Classification {
    let has_none = members.iter().any(is_none_type);
    let non_none: Vec<&TypeInfo> = members.iter().filter(|m| !is_none_type(m)).collect();

    match non_none.as_slice() {
        [] => Classification::leaf(Shape::Unknown),
        // Optional[X] and a single-member Union[X] are both just X
        [only] if has_none || members.len() == 1 => classify(only),
        _ => Classification {
            shape: Shape::Union,
            inner: members,
        },
    }
}

fn arg_or_any(type_info: &TypeInfo, index: usize) -> TypeInfo {
    type_info
        .generic_args
        .get(index)
        .filter(|arg| !arg.is_empty())
        .cloned()
        .unwrap_or_else(TypeInfo::any)
}
