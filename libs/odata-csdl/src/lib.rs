#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Entity Data Model for OData filter compilation.
//!
//! - [`SchemaModel`] and its declarations (`EntityType`, `ComplexType`,
//!   `EntityContainer`, `Function`)
//! - [`EdmKind`] / [`EdmFamily`] for primitive type reasoning
//! - [`parse_csdl`] to build a model from a CSDL (EDMX) document
//!
//! The model is immutable once built and is meant to be shared by reference
//! across concurrent filter compilations.

pub mod edm;
pub mod error;
mod flatten;
pub mod model;
mod reader;

pub use edm::{EDM_NULL, EDM_UNKNOWN, EdmFamily, EdmKind};
pub use error::CsdlError;
pub use flatten::FlatProperty;
pub use model::{
    ComplexType, EntityContainer, EntitySet, EntityType, Function, Parameter, Property,
    SchemaModel, StructuredType, short_name,
};
pub use reader::parse_csdl;
