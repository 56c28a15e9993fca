use std::sync::Arc;

use odata_csdl::SchemaModel;
use tracing::debug;

use crate::catalog::FunctionCatalog;
use crate::compiler::{SqlCompiler, SqlResult};
use crate::error::FilterError;
use crate::mapping::PropertyMap;
use crate::normalize::{DEFAULT_FUNCTIONS, normalize_function_names};
use crate::options::FilterOptions;
use crate::parser::{parse_filter, strip_filter_prefix};
use crate::validator::FilterValidator;

/// Normalize, parse, validate and compile a `$filter` for one entity set.
///
/// The schema is shared; catalogs and options are fixed at construction, so a
/// pipeline can serve concurrent requests by reference.
#[derive(Clone, Debug)]
pub struct FilterPipeline {
    schema: Arc<SchemaModel>,
    functions: FunctionCatalog,
    properties: PropertyMap,
    options: FilterOptions,
    known_functions: Vec<String>,
}

impl FilterPipeline {
    #[must_use]
    pub fn new(
        schema: Arc<SchemaModel>,
        functions: FunctionCatalog,
        properties: PropertyMap,
    ) -> Self {
        let mut known_functions: Vec<String> =
            DEFAULT_FUNCTIONS.iter().map(|f| (*f).to_owned()).collect();
        for name in functions.names() {
            if !known_functions.iter().any(|k| k.eq_ignore_ascii_case(name)) {
                known_functions.push(name.to_owned());
            }
        }
        Self {
            schema,
            functions,
            properties,
            options: FilterOptions::default(),
            known_functions,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaModel {
        &self.schema
    }

    /// Compile `filter` against `entity_set`.
    ///
    /// A blank filter (with or without a `$filter=` prefix) yields
    /// [`SqlResult::empty`].
    ///
    /// # Errors
    /// The first failure of any stage: [`FilterError::TooLong`], then syntax,
    /// validation and compile errors.
    pub fn process(&self, filter: &str, entity_set: &str) -> Result<SqlResult, FilterError> {
        let body = strip_filter_prefix(filter).trim();
        if body.is_empty() {
            debug!(entity_set, "empty filter");
            return Ok(SqlResult::empty());
        }

        let length = body.chars().count();
        if length > self.options.max_filter_length {
            return Err(FilterError::TooLong {
                length,
                max: self.options.max_filter_length,
            });
        }

        let normalized = normalize_function_names(body, &self.known_functions);
        let tree = parse_filter(&normalized)?;
        debug!(entity_set, filter = %tree, "filter parsed");

        FilterValidator::new(&self.schema, &self.functions).validate(&tree, entity_set)?;
        debug!(entity_set, "filter validated");

        let result = SqlCompiler::new(&self.properties, &self.functions)
            .with_options(self.options.clone())
            .compile(&tree)?;
        Ok(result)
    }

    /// Like [`Self::process`] but returns only the SQL text.
    ///
    /// # Errors
    /// Same as [`Self::process`].
    pub fn process_sql(&self, filter: &str, entity_set: &str) -> Result<Option<String>, FilterError> {
        self.process(filter, entity_set).map(|result| result.sql)
    }
}
