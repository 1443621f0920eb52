//! Type descriptors for handler parameters and return annotations.
//!
//! A [`TypeInfo`] is an immutable tree naming a type and its generic arguments. Descriptors are
//! supplied by whoever documents a handler; the rest of the crate only inspects them. Two textual
//! notations are understood by [`TypeInfo::parse`]:
//!
//! - Rust type syntax (`Vec<i64>`, `Option<String>`, `(String, u8)`), parsed with `syn`
//! - annotation syntax (`List[int]`, `Dict[str, Any]`, `Optional[str]`, `int | None`)
//!
//! Parsing never fails. Input that cannot be understood becomes an opaque named type, which
//! later degrades to an untyped schema field.

use log::{debug, warn};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Name given to Rust tuple types and to parenthesised annotation tuples.
pub const TUPLE_NAME: &str = "tuple";
/// Deepest generic nesting [`TypeInfo::parse`] accepts before giving up on an annotation.
pub const MAX_NESTING_DEPTH: usize = 64;
/// Name given to `A | B` annotations.
pub const UNION_NAME: &str = "Union";
/// Name of the unit type `()`.
pub const UNIT_NAME: &str = "()";

/// How a descriptor was written, used only to render it back as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notation {
    /// `List[int]`
    #[default]
    Bracket,
    /// `Vec<i32>`
    Angle,
    /// `(String, i32)`
    Tuple,
    /// `int | str`
    Pipe,
}

/// Type descriptor for a parameter or return annotation.
///
/// Equality and hashing are structural over the name and generic arguments; the notation is
/// presentation only, so `List[int]` written either way compares equal.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    /// The type name as written (e.g. "int", "typing.List", "serde_json::Value")
    pub name: String,
    /// Generic type arguments in declaration order
    pub generic_args: Vec<TypeInfo>,
    /// Notation used when rendering the descriptor
    pub notation: Notation,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.generic_args == other.generic_args
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.generic_args.hash(state);
    }
}

impl TypeInfo {
    /// The "no annotation" sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A non-generic type such as `int` or `User`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic_args: Vec::new(),
            notation: Notation::Bracket,
        }
    }

    /// A parameterised type such as `Dict[str, int]`.
    pub fn generic(name: impl Into<String>, generic_args: Vec<TypeInfo>) -> Self {
        Self {
            name: name.into(),
            generic_args,
            notation: Notation::Bracket,
        }
    }

    /// `List[inner]`
    pub fn list(inner: TypeInfo) -> Self {
        Self::generic("List", vec![inner])
    }

    /// `Dict[key, value]`
    pub fn dict(key: TypeInfo, value: TypeInfo) -> Self {
        Self::generic("Dict", vec![key, value])
    }

    /// `Tuple[members...]`
    pub fn tuple(members: Vec<TypeInfo>) -> Self {
        Self::generic("Tuple", members)
    }

    /// `Union[members...]`
    pub fn union(members: Vec<TypeInfo>) -> Self {
        Self::generic(UNION_NAME, members)
    }

    /// `Optional[inner]`
    pub fn optional(inner: TypeInfo) -> Self {
        Self::generic("Optional", vec![inner])
    }

    /// The `Any` sentinel.
    pub fn any() -> Self {
        Self::named("Any")
    }

    /// The None type.
    pub fn none() -> Self {
        Self::named("None")
    }

    /// Whether this is the "no annotation" sentinel.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.generic_args.is_empty()
    }

    /// Last path segment of the name: `typing.List` and `std::vec::Vec` become `List` and `Vec`.
    pub fn base_name(&self) -> &str {
        let name = self.name.rsplit("::").next().unwrap_or(&self.name);
        name.rsplit('.').next().unwrap_or(name)
    }

    /// Builds a descriptor with a different notation, keeping name and arguments.
    pub fn with_notation(mut self, notation: Notation) -> Self {
        self.notation = notation;
        self
    }

    /// Parses an annotation written in Rust or annotation syntax.
    pub fn parse(annotation: &str) -> Self {
        let trimmed = annotation.trim();
        if trimmed.is_empty() {
            return Self::empty();
        }

        if nesting_depth(trimmed) > MAX_NESTING_DEPTH {
            warn!(
                "Annotation nests deeper than {} levels, treating it as unknown",
                MAX_NESTING_DEPTH
            );
            return Self::named("Unknown");
        }

        if let Ok(ty) = syn::parse_str::<syn::Type>(trimmed) {
            return Self::from_syn(&ty);
        }

        debug!("Parsing annotation with bracket notation: {}", trimmed);
        AnnotationParser::new(trimmed).parse()
    }

    /// Converts a `syn::Type` into a descriptor.
    pub fn from_syn(ty: &syn::Type) -> Self {
        match ty {
            syn::Type::Path(type_path) => Self::from_syn_path(&type_path.path),
            syn::Type::Tuple(tuple) => {
                if tuple.elems.is_empty() {
                    Self::named(UNIT_NAME).with_notation(Notation::Tuple)
                } else {
                    Self::generic(TUPLE_NAME, tuple.elems.iter().map(Self::from_syn).collect())
                        .with_notation(Notation::Tuple)
                }
            }
            syn::Type::Reference(reference) => Self::from_syn(&reference.elem),
            syn::Type::Paren(paren) => Self::from_syn(&paren.elem),
            syn::Type::Group(group) => Self::from_syn(&group.elem),
            syn::Type::Slice(slice) => {
                Self::generic("Vec", vec![Self::from_syn(&slice.elem)]).with_notation(Notation::Angle)
            }
            syn::Type::Array(array) => {
                Self::generic("Vec", vec![Self::from_syn(&array.elem)]).with_notation(Notation::Angle)
            }
            _ => {
                // Function pointers, trait objects and the like have no schema shape
                Self::named("Unknown")
            }
        }
    }

    fn from_syn_path(path: &syn::Path) -> Self {
        let name = path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect::<Vec<_>>()
            .join("::");

        let mut generic_args = Vec::new();
        if let Some(segment) = path.segments.last() {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                for arg in &args.args {
                    if let syn::GenericArgument::Type(inner_ty) = arg {
                        generic_args.push(Self::from_syn(inner_ty));
                    }
                }
            }
        }

        Self {
            name,
            generic_args,
            notation: Notation::Angle,
        }
    }
}

impl From<&str> for TypeInfo {
    fn from(annotation: &str) -> Self {
        Self::parse(annotation)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, separator: &str| -> fmt::Result {
            for (index, arg) in self.generic_args.iter().enumerate() {
                if index > 0 {
                    f.write_str(separator)?;
                }
                write!(f, "{}", arg)?;
            }
            Ok(())
        };

        match self.notation {
            Notation::Tuple if self.name == TUPLE_NAME => {
                f.write_str("(")?;
                join(f, ", ")?;
                f.write_str(")")
            }
            Notation::Pipe => join(f, " | "),
            _ if self.generic_args.is_empty() => f.write_str(&self.name),
            Notation::Angle => {
                write!(f, "{}<", self.name)?;
                join(f, ", ")?;
                f.write_str(">")
            }
            _ => {
                write!(f, "{}[", self.name)?;
                join(f, ", ")?;
                f.write_str("]")
            }
        }
    }
}

/// Deepest bracket nesting in an annotation. Each `&` counts as one more level.
fn nesting_depth(annotation: &str) -> usize {
    let mut depth = 0usize;
    let mut max_depth = 0usize;
    let mut references = 0usize;
    for c in annotation.chars() {
        match c {
            '[' | '(' | '<' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            ']' | ')' | '>' => depth = depth.saturating_sub(1),
            '&' => references += 1,
            _ => {}
        }
    }
    max_depth + references
}

/// Recursive-descent parser for bracket annotations.
///
/// Grammar: `union := primary ('|' primary)*`, `primary := '(' list ')' | name ['[' list ']']`.
/// Unbalanced or truncated input is accepted up to the point where it stops making sense.
struct AnnotationParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> AnnotationParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(mut self) -> TypeInfo {
        let parsed = self.parse_union();
        self.skip_whitespace();
        if self.pos < self.input.len() {
            debug!(
                "Ignoring trailing annotation text: {}",
                &self.input[self.pos..]
            );
        }
        parsed
    }

    fn parse_union(&mut self) -> TypeInfo {
        let first = self.parse_primary();
        let mut members = vec![first];

        while self.eat('|') {
            members.push(self.parse_primary());
        }

        if members.len() == 1 {
            members.remove(0)
        } else {
            TypeInfo::union(members).with_notation(Notation::Pipe)
        }
    }

    fn parse_primary(&mut self) -> TypeInfo {
        if self.eat('(') {
            let members = self.parse_list(')');
            return if members.is_empty() {
                TypeInfo::named(UNIT_NAME).with_notation(Notation::Tuple)
            } else {
                TypeInfo::generic(TUPLE_NAME, members).with_notation(Notation::Tuple)
            };
        }

        let name = self.parse_name();
        if self.eat('[') {
            let generic_args = self.parse_list(']');
            TypeInfo::generic(name, generic_args)
        } else {
            TypeInfo::named(name)
        }
    }

    fn parse_list(&mut self, close: char) -> Vec<TypeInfo> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.eat(close) || self.pos >= self.input.len() {
                break;
            }
            let before = self.pos;
            items.push(self.parse_union());
            if !self.eat(',') {
                self.eat(close);
                break;
            }
            if self.pos == before {
                break;
            }
        }
        items
    }

    fn parse_name(&mut self) -> String {
        self.skip_whitespace();
        let rest = &self.input[self.pos..];
        let end = rest
            .find(|c: char| matches!(c, '[' | ']' | '(' | ')' | ',' | '|'))
            .unwrap_or(rest.len());
        self.pos += end;
        let name = rest[..end].trim();
        let name = name.trim_matches(|c| c == '\'' || c == '"');
        if name.is_empty() {
            "Unknown".to_string()
        } else {
            name.to_string()
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.input[self.pos..].starts_with(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }
}
