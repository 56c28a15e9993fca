#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! OData `$filter` to parameterized SQL.
//!
//! A filter goes through four stages, driven by [`FilterPipeline`]:
//!
//! 1. [`normalize_function_names`] lower-cases known function identifiers
//! 2. [`parse_filter`] builds a [`FilterNode`] tree
//! 3. [`FilterValidator`] checks property paths, functions and IN-lists
//!    against a [`odata_csdl::SchemaModel`]
//! 4. [`SqlCompiler`] renders SQL through a [`PropertyMap`] and a
//!    [`FunctionCatalog`], binding every literal as a named parameter
//!
//! ```rust,ignore
//! let pipeline = FilterPipeline::new(schema, functions, properties);
//! let result = pipeline.process("Name eq 'x' and Price gt 10", "Products")?;
//! assert_eq!(result.sql.as_deref(), Some("name = @p1 AND price > @p2"));
//! ```

pub mod ast;
mod catalog;
mod compiler;
pub mod error;
pub mod literal;
mod mapping;
mod normalize;
mod options;
mod parser;
mod pipeline;
mod validator;

pub use ast::{FilterNode, FunctionCall, LogicalOperator};
pub use catalog::{FunctionCatalog, FunctionMapping, WildcardPosition};
pub use compiler::{ComparisonOperator, METERS_PER_DEGREE, Parameters, SqlCompiler, SqlResult};
pub use error::{CompileError, ExpressionError, FilterError, SyntaxError, ValidationError};
pub use literal::SqlValue;
pub use mapping::{PropertyMap, PropertyMapping};
pub use normalize::{DEFAULT_FUNCTIONS, normalize_function_names};
pub use options::FilterOptions;
pub use parser::{MAX_DEPTH, parse_filter, strip_filter_prefix};
pub use pipeline::FilterPipeline;
pub use validator::{DISTANCE_UNITS, FilterValidator};
