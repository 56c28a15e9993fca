//! OData property paths and the SQL columns they are stored in.

use odata_csdl::{EdmKind, FlatProperty};
use serde::{Deserialize, Serialize};

/// How one OData property path is expressed in SQL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMapping {
    /// Property path as written in filters, e.g. `Address/Street`.
    pub property: String,
    /// Column (or expression) used in the select list.
    pub query: String,
    pub edm_type: String,
    /// Overrides `query` inside WHERE clauses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
}

impl PropertyMapping {
    #[must_use]
    pub fn new(
        property: impl Into<String>,
        query: impl Into<String>,
        edm_type: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            query: query.into(),
            edm_type: edm_type.into(),
            where_clause: None,
        }
    }

    #[must_use]
    pub fn with_where_clause(mut self, expression: impl Into<String>) -> Self {
        self.where_clause = Some(expression.into());
        self
    }

    /// SQL used when the property appears in a filter.
    #[must_use]
    pub fn filter_sql(&self) -> &str {
        self.where_clause.as_deref().unwrap_or(&self.query)
    }

    #[must_use]
    pub fn kind(&self) -> EdmKind {
        EdmKind::from_type_name(self.edm_type.trim())
    }
}

/// Case-insensitive table from property path to [`PropertyMapping`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap {
    mappings: Vec<PropertyMapping>,
}

impl PropertyMap {
    #[must_use]
    pub fn new(mappings: Vec<PropertyMapping>) -> Self {
        Self { mappings }
    }

    /// Skeleton map with one entry per flattened schema leaf. Columns are the
    /// lower-cased paths with `/` replaced by `_`.
    #[must_use]
    pub fn from_flattened(properties: &[FlatProperty]) -> Self {
        properties
            .iter()
            .map(|p| {
                PropertyMapping::new(
                    p.path.clone(),
                    p.path.replace('/', "_").to_lowercase(),
                    p.type_name.clone(),
                )
            })
            .collect()
    }

    #[must_use]
    pub fn get(&self, property: &str) -> Option<&PropertyMapping> {
        self.mappings
            .iter()
            .find(|m| m.property.eq_ignore_ascii_case(property))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyMapping> {
        self.mappings.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl<'a> IntoIterator for &'a PropertyMap {
    type Item = &'a PropertyMapping;
    type IntoIter = std::slice::Iter<'a, PropertyMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}

impl FromIterator<PropertyMapping> for PropertyMap {
    fn from_iter<T: IntoIterator<Item = PropertyMapping>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
