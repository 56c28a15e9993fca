use crate::edm::EdmKind;
use crate::model::{Property, SchemaModel, StructuredType};

/// A primitive leaf reachable from an entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatProperty {
    /// Slash-separated path, e.g. `Address/Street`.
    pub path: String,
    pub type_name: String,
}

impl SchemaModel {
    /// Flatten the properties of `entity_type` into primitive leaf paths,
    /// descending through complex types. With `only` set, leaves of other
    /// kinds are dropped.
    ///
    /// Returns an empty list when the entity type is unknown. Properties whose
    /// type is neither primitive nor a known complex type are skipped, as are
    /// complex types that would recurse into themselves.
    #[must_use]
    pub fn flatten_entity_properties(
        &self,
        entity_type: &str,
        only: Option<EdmKind>,
    ) -> Vec<FlatProperty> {
        let mut out = Vec::new();
        if let Some(entity) = self.entity_type(entity_type) {
            let mut visiting = Vec::new();
            self.walk(entity, None, only, &mut visiting, &mut out);
        }
        out
    }

    fn walk<'a>(
        &'a self,
        owner: &'a dyn StructuredType,
        prefix: Option<&str>,
        only: Option<EdmKind>,
        visiting: &mut Vec<&'a str>,
        out: &mut Vec<FlatProperty>,
    ) {
        for prop in owner.properties() {
            self.walk_property(prop, prefix, only, visiting, out);
        }
    }

    fn walk_property<'a>(
        &'a self,
        prop: &'a Property,
        prefix: Option<&str>,
        only: Option<EdmKind>,
        visiting: &mut Vec<&'a str>,
        out: &mut Vec<FlatProperty>,
    ) {
        let type_name = prop.type_name.trim();
        if type_name.is_empty() {
            return;
        }
        let path = match prefix {
            Some(p) => format!("{p}/{}", prop.name),
            None => prop.name.clone(),
        };

        if is_edm_primitive(type_name) {
            if only.is_none_or(|k| EdmKind::from_type_name(type_name) == k) {
                out.push(FlatProperty {
                    path,
                    type_name: type_name.to_owned(),
                });
            }
            return;
        }

        let Some(complex) = self.resolve_complex_type(type_name) else {
            return;
        };
        if visiting.contains(&complex.name.as_str()) {
            return;
        }
        visiting.push(&complex.name);
        self.walk(complex, Some(path.as_str()), only, visiting, out);
        visiting.pop();
    }
}

fn is_edm_primitive(type_name: &str) -> bool {
    type_name
        .get(..4)
        .is_some_and(|head| head.eq_ignore_ascii_case("Edm."))
}
