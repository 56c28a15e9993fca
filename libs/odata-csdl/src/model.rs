//! In-memory Entity Data Model.
//!
//! A [`SchemaModel`] is built once from a CSDL document and shared read-only
//! afterwards. Nothing here has interior mutability, so `&SchemaModel` can be
//! handed to any number of threads.

use crate::edm::{EDM_UNKNOWN, EdmKind};

/// A structural property of an entity or complex type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    /// `Edm.*` primitive or a (possibly qualified) complex type name.
    pub type_name: String,
    pub kind: EdmKind,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub max_length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

impl Property {
    /// Property with the given name and raw type; the kind is derived from the
    /// type name and the property is nullable.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            kind: EdmKind::from_type_name(&type_name),
            type_name,
            nullable: true,
            default_value: None,
            max_length: None,
            precision: None,
            scale: None,
        }
    }

    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.kind != EdmKind::Unknown
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityType {
    pub name: String,
    pub properties: Vec<Property>,
    pub keys: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComplexType {
    pub name: String,
    pub properties: Vec<Property>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntitySet {
    pub name: String,
    /// Usually namespace-qualified, e.g. `ODataDemo.Product`.
    pub entity_type: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityContainer {
    pub name: String,
    pub entity_sets: Vec<EntitySet>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

/// Function signature declared in the schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: String,
}

/// The whole model, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaModel {
    pub entity_types: Vec<EntityType>,
    pub complex_types: Vec<ComplexType>,
    pub functions: Vec<Function>,
    pub containers: Vec<EntityContainer>,
}

/// Last dotted segment of a qualified type name.
#[must_use]
pub fn short_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Shared view over the properties of an entity or complex type.
pub trait StructuredType {
    fn type_name(&self) -> &str;
    fn properties(&self) -> &[Property];

    /// Case-insensitive property lookup.
    fn property(&self, name: &str) -> Option<&Property> {
        self.properties()
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

impl StructuredType for EntityType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> &[Property] {
        &self.properties
    }
}

impl StructuredType for ComplexType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> &[Property] {
        &self.properties
    }
}

impl SchemaModel {
    /// Case-insensitive lookup across all containers.
    #[must_use]
    pub fn entity_set(&self, name: &str) -> Option<&EntitySet> {
        self.containers
            .iter()
            .flat_map(|c| c.entity_sets.iter())
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Entity type by short name, ignoring case.
    #[must_use]
    pub fn entity_type(&self, name: &str) -> Option<&EntityType> {
        let wanted = short_name(name);
        self.entity_types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(wanted))
    }

    /// Entity type an entity set points at. `None` both when the set does not
    /// exist and when its type reference dangles.
    #[must_use]
    pub fn entity_type_for_set(&self, set_name: &str) -> Option<&EntityType> {
        self.entity_set(set_name)
            .and_then(|set| self.entity_type(&set.entity_type))
    }

    /// Resolve a complex type by its full dotted name or by its last segment.
    #[must_use]
    pub fn resolve_complex_type(&self, name: &str) -> Option<&ComplexType> {
        let wanted = short_name(name);
        self.complex_types.iter().find(|t| {
            t.name.eq_ignore_ascii_case(name) || t.name.eq_ignore_ascii_case(wanted)
        })
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Walk a slash-separated path from `entity_type` and return the declared
    /// type of the final segment, or `Edm.Unknown` if any segment fails to
    /// resolve.
    #[must_use]
    pub fn property_path_type(&self, entity_type: &str, path: &str) -> String {
        let Some(root) = self.entity_type(entity_type) else {
            return EDM_UNKNOWN.to_owned();
        };
        let mut owner: &dyn StructuredType = root;
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            let Some(property) = owner.property(segment) else {
                return EDM_UNKNOWN.to_owned();
            };
            if segments.peek().is_none() {
                return property.type_name.clone();
            }
            if property.is_primitive() {
                return EDM_UNKNOWN.to_owned();
            }
            match self.resolve_complex_type(&property.type_name) {
                Some(complex) => owner = complex,
                None => return EDM_UNKNOWN.to_owned(),
            }
        }
        EDM_UNKNOWN.to_owned()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn sample() -> SchemaModel {
        let address = ComplexType {
            name: "Address".to_owned(),
            properties: vec![
                Property::new("Street", "Edm.String"),
                Property::new("Geo", "Demo.Location"),
            ],
        };
        SchemaModel {
            entity_types: vec![EntityType {
                name: "Product".to_owned(),
                properties: vec![
                    Property::new("ID", "Edm.Int32"),
                    Property::new("Address", "Demo.Address"),
                ],
                keys: vec!["ID".to_owned()],
            }],
            complex_types: vec![
                address,
                ComplexType {
                    name: "Location".to_owned(),
                    properties: vec![Property::new("Point", "Edm.GeographyPoint")],
                },
            ],
            functions: Vec::new(),
            containers: vec![EntityContainer {
                name: "Default".to_owned(),
                entity_sets: vec![
                    EntitySet {
                        name: "Products".to_owned(),
                        entity_type: "Demo.Product".to_owned(),
                    },
                    EntitySet {
                        name: "Ghosts".to_owned(),
                        entity_type: "Demo.Ghost".to_owned(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn entity_set_lookup_ignores_case() {
        let model = sample();
        assert!(model.entity_set("products").is_some());
        assert_eq!(
            model.entity_type_for_set("PRODUCTS").map(|t| t.name.as_str()),
            Some("Product")
        );
    }

    #[test]
    fn dangling_entity_type_resolves_to_none() {
        let model = sample();
        assert!(model.entity_set("Ghosts").is_some());
        assert!(model.entity_type_for_set("Ghosts").is_none());
    }

    #[test]
    fn path_type_walks_complex_hops() {
        let model = sample();
        assert_eq!(model.property_path_type("Product", "ID"), "Edm.Int32");
        assert_eq!(
            model.property_path_type("Product", "address/street"),
            "Edm.String"
        );
        assert_eq!(
            model.property_path_type("Demo.Product", "Address/Geo/Point"),
            "Edm.GeographyPoint"
        );
    }

    #[test]
    fn path_type_returns_unknown_sentinel() {
        let model = sample();
        assert_eq!(model.property_path_type("Product", "Nope"), EDM_UNKNOWN);
        assert_eq!(model.property_path_type("Product", "ID/Deeper"), EDM_UNKNOWN);
        assert_eq!(model.property_path_type("Missing", "ID"), EDM_UNKNOWN);
    }

    #[test]
    fn complex_type_resolves_by_full_or_short_name() {
        let model = sample();
        assert!(model.resolve_complex_type("Demo.Address").is_some());
        assert!(model.resolve_complex_type("address").is_some());
        assert!(model.resolve_complex_type("Demo.Unknown").is_none());
    }
}
