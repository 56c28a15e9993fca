//! Filter functions and the SQL they render to.

use odata_csdl::EdmFamily;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WildcardPosition {
    Left,
    Right,
    #[serde(alias = "left_and_right")]
    Both,
}

/// One filter function, e.g. `startswith` rendered as `ILIKE({0}, {1})`.
///
/// `sql_template` uses positional `{n}` placeholders for the compiled
/// arguments; `@srid` is replaced by the storage SRID. Argument types accept
/// either `Edm.*` names or family names such as `string`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMapping {
    pub name: String,
    pub sql_template: String,
    #[serde(default)]
    pub argument_types: Vec<String>,
    pub return_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcard_position: Option<WildcardPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcard_symbol: Option<String>,
}

impl FunctionMapping {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        sql_template: impl Into<String>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            sql_template: sql_template.into(),
            argument_types: Vec::new(),
            return_type: return_type.into(),
            wildcard_position: None,
            wildcard_symbol: None,
        }
    }

    #[must_use]
    pub fn with_arguments<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argument_types = types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_wildcard(mut self, position: WildcardPosition, symbol: impl Into<String>) -> Self {
        self.wildcard_position = Some(position);
        self.wildcard_symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.argument_types.len()
    }

    /// Family of the argument declared at `index`, `Unknown` past the end.
    #[must_use]
    pub fn argument_family(&self, index: usize) -> EdmFamily {
        self.argument_types
            .get(index)
            .map_or(EdmFamily::Unknown, |t| EdmFamily::from_type_name(t))
    }

    /// Boolean functions are compiled to `((...) = 1)` predicates.
    #[must_use]
    pub fn returns_boolean(&self) -> bool {
        self.return_type.trim().eq_ignore_ascii_case("Edm.Boolean")
    }

    /// Wrap `value` with the wildcard symbol at the declared position.
    #[must_use]
    pub fn apply_wildcard(&self, value: &str) -> String {
        let symbol = self.wildcard_symbol.as_deref().unwrap_or("%");
        match self.wildcard_position {
            Some(WildcardPosition::Right) => format!("{value}{symbol}"),
            Some(WildcardPosition::Left) => format!("{symbol}{value}"),
            Some(WildcardPosition::Both) => format!("{symbol}{value}{symbol}"),
            None => value.to_owned(),
        }
    }

    /// Whether this is a spatial distance function whose second argument is
    /// a unit token.
    #[must_use]
    pub fn is_distance(&self) -> bool {
        self.name.eq_ignore_ascii_case("distance")
    }
}

/// Case-insensitive lookup table of [`FunctionMapping`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionCatalog {
    functions: Vec<FunctionMapping>,
}

impl FunctionCatalog {
    #[must_use]
    pub fn new(functions: Vec<FunctionMapping>) -> Self {
        Self { functions }
    }

    /// Add or replace a function, matching names case-insensitively.
    pub fn insert(&mut self, mapping: FunctionMapping) {
        if let Some(existing) = self
            .functions
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(&mapping.name))
        {
            *existing = mapping;
        } else {
            self.functions.push(mapping);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FunctionMapping> {
        self.functions
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|f| f.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FunctionMapping> {
        self.functions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl<'a> IntoIterator for &'a FunctionCatalog {
    type Item = &'a FunctionMapping;
    type IntoIter = std::slice::Iter<'a, FunctionMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.functions.iter()
    }
}

impl FromIterator<FunctionMapping> for FunctionCatalog {
    fn from_iter<T: IntoIterator<Item = FunctionMapping>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
