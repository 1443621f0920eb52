//! OpenAPI documents from annotated routes.
//!
//! Handlers opt into documentation by carrying a [`routes::RouteDoc`]: a summary, tags, the
//! parameter types or an explicit parameter schema, and a return type annotation. An
//! aggregation pass walks every endpoint of the host application and turns each documented
//! handler into one OpenAPI operation, inferring schemas from the annotations.
//!
//! # Architecture
//!
//! 1. [`type_info`] - Type descriptors, parsed from Rust or bracket annotation syntax
//! 2. [`type_classifier`] - Sorts descriptors into shape categories
//! 3. [`schema_generator`] - Synthesizes schema field trees from descriptors
//! 4. [`responses`] - Registry mapping return types to response wrappers and content types
//! 5. [`routes`] - Route metadata and the [`routes::HostApplication`] seam
//! 6. [`openapi_builder`] - The specification document and its projections
//! 7. [`aggregator`] - Walks a host application and fills a document
//! 8. [`manifest`] and [`scanner`] - Load route tables from YAML/JSON manifests
//! 9. [`serializer`] - Renders documents as YAML or JSON
//!
//! # Example Usage
//!
//! ```
//! use openapi_from_routes::aggregator::{AutoDoc, AutoDocConfig};
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
//!
//! let auto_doc = AutoDoc::new(AutoDocConfig::new("Math App"));
//! let spec = auto_doc.aggregate(&table);
//! assert!(spec.operation("/math/add", HttpMethod::Get).is_some());
//! println!("{}", spec.to_yaml().unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod aggregator;
pub mod cli;
pub mod error;
pub mod manifest;
pub mod openapi_builder;
pub mod responses;
pub mod routes;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod type_classifier;
pub mod type_info;
