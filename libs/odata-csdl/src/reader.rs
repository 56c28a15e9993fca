//! CSDL (EDMX) document reader.
//!
//! The XML is first deserialized into loosely-typed `Raw*` mirrors with every
//! attribute optional, then converted into the [`SchemaModel`] while checking
//! required names and types. Declarations are checked per schema in the order
//! containers, entity types, complex types, functions.

use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::debug;

use crate::edm::EdmKind;
use crate::error::CsdlError;
use crate::model::{
    ComplexType, EntityContainer, EntitySet, EntityType, Function, Parameter, Property,
    SchemaModel,
};

#[derive(Debug, Deserialize)]
struct RawEdmx {
    #[serde(rename = "DataServices")]
    data_services: Option<RawDataServices>,
}

#[derive(Debug, Deserialize)]
struct RawDataServices {
    #[serde(rename = "Schema", default)]
    schemas: Vec<RawSchema>,
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(rename = "$value", default)]
    items: Vec<RawSchemaItem>,
}

// Unused payloads only exist so the deserializer skips those elements.
#[allow(dead_code)]
#[derive(Debug, Deserialize)]
enum RawSchemaItem {
    EntityContainer(RawEntityContainer),
    EntityType(RawEntityType),
    ComplexType(RawComplexType),
    Function(RawFunction),
    EnumType(IgnoredAny),
    TypeDefinition(IgnoredAny),
    Action(IgnoredAny),
    Term(IgnoredAny),
    Annotation(IgnoredAny),
    Annotations(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct RawEntityContainer {
    #[serde(rename = "@Name")]
    name: Option<String>,
    #[serde(rename = "$value", default)]
    items: Vec<RawContainerItem>,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
enum RawContainerItem {
    EntitySet(RawEntitySet),
    Singleton(IgnoredAny),
    FunctionImport(IgnoredAny),
    ActionImport(IgnoredAny),
    Annotation(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct RawEntitySet {
    #[serde(rename = "@Name")]
    name: Option<String>,
    #[serde(rename = "@EntityType")]
    entity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEntityType {
    #[serde(rename = "@Name")]
    name: Option<String>,
    #[serde(rename = "Key")]
    key: Option<RawKey>,
    #[serde(rename = "$value", default)]
    items: Vec<RawStructuralItem>,
}

#[derive(Debug, Deserialize)]
struct RawComplexType {
    #[serde(rename = "@Name")]
    name: Option<String>,
    #[serde(rename = "$value", default)]
    items: Vec<RawStructuralItem>,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
enum RawStructuralItem {
    Property(RawProperty),
    NavigationProperty(IgnoredAny),
    Annotation(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct RawKey {
    #[serde(rename = "PropertyRef", default)]
    property_refs: Vec<RawPropertyRef>,
}

#[derive(Debug, Deserialize)]
struct RawPropertyRef {
    #[serde(rename = "@Name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    #[serde(rename = "@Name")]
    name: Option<String>,
    #[serde(rename = "@Type")]
    type_name: Option<String>,
    #[serde(rename = "@Nullable")]
    nullable: Option<String>,
    #[serde(rename = "@DefaultValue")]
    default_value: Option<String>,
    #[serde(rename = "@MaxLength")]
    max_length: Option<String>,
    #[serde(rename = "@Precision")]
    precision: Option<String>,
    #[serde(rename = "@Scale")]
    scale: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFunction {
    #[serde(rename = "@Name")]
    name: Option<String>,
    #[serde(rename = "Parameter", default)]
    parameters: Vec<RawParameter>,
    #[serde(rename = "ReturnType")]
    return_type: Option<RawReturnType>,
}

#[derive(Debug, Deserialize)]
struct RawParameter {
    #[serde(rename = "@Name")]
    name: Option<String>,
    #[serde(rename = "@Type")]
    type_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawReturnType {
    #[serde(rename = "@Type")]
    type_name: Option<String>,
}

/// Build a [`SchemaModel`] from CSDL text.
///
/// # Errors
/// - [`CsdlError::Parse`] when the XML itself cannot be read.
/// - [`CsdlError::InvalidFormat`] when the `DataServices` wrapper is missing.
/// - One of the `*Required` variants for the first declaration missing a
///   required name or type.
pub fn parse_csdl(text: &str) -> Result<SchemaModel, CsdlError> {
    let raw: RawEdmx = quick_xml::de::from_str(text)?;
    let data_services = raw.data_services.ok_or(CsdlError::InvalidFormat)?;

    let mut model = SchemaModel::default();
    for schema in data_services.schemas {
        read_schema(schema, &mut model)?;
    }

    debug!(
        entity_types = model.entity_types.len(),
        complex_types = model.complex_types.len(),
        functions = model.functions.len(),
        containers = model.containers.len(),
        "CSDL schema loaded"
    );
    Ok(model)
}

impl SchemaModel {
    /// See [`parse_csdl`].
    ///
    /// # Errors
    /// Same as [`parse_csdl`].
    pub fn from_csdl(text: &str) -> Result<Self, CsdlError> {
        parse_csdl(text)
    }
}

fn read_schema(schema: RawSchema, model: &mut SchemaModel) -> Result<(), CsdlError> {
    let mut containers = Vec::new();
    let mut entity_types = Vec::new();
    let mut complex_types = Vec::new();
    let mut functions = Vec::new();
    for item in schema.items {
        match item {
            RawSchemaItem::EntityContainer(c) => containers.push(c),
            RawSchemaItem::EntityType(t) => entity_types.push(t),
            RawSchemaItem::ComplexType(t) => complex_types.push(t),
            RawSchemaItem::Function(f) => functions.push(f),
            RawSchemaItem::EnumType(_)
            | RawSchemaItem::TypeDefinition(_)
            | RawSchemaItem::Action(_)
            | RawSchemaItem::Term(_)
            | RawSchemaItem::Annotation(_)
            | RawSchemaItem::Annotations(_) => {}
        }
    }

    for container in containers {
        model.containers.push(read_container(container)?);
    }
    for entity_type in entity_types {
        model.entity_types.push(read_entity_type(entity_type)?);
    }
    for complex_type in complex_types {
        model.complex_types.push(read_complex_type(complex_type)?);
    }
    for function in functions {
        model.functions.push(read_function(function)?);
    }
    Ok(())
}

/// Treat an empty attribute the same as a missing one.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn read_container(raw: RawEntityContainer) -> Result<EntityContainer, CsdlError> {
    let name = present(raw.name).ok_or(CsdlError::EntityContainerNameRequired)?;
    let mut entity_sets = Vec::new();
    for item in raw.items {
        let RawContainerItem::EntitySet(set) = item else {
            continue;
        };
        let set_name = present(set.name).ok_or(CsdlError::EntitySetNameRequired)?;
        let entity_type =
            present(set.entity_type).ok_or(CsdlError::EntitySetEntityTypeRequired)?;
        entity_sets.push(EntitySet {
            name: set_name,
            entity_type,
        });
    }
    Ok(EntityContainer { name, entity_sets })
}

fn read_entity_type(raw: RawEntityType) -> Result<EntityType, CsdlError> {
    let name = present(raw.name).ok_or(CsdlError::EntityTypeNameRequired)?;
    let keys = raw
        .key
        .map(|k| k.property_refs)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| present(r.name))
        .collect();

    let mut properties = Vec::new();
    for item in raw.items {
        let RawStructuralItem::Property(mut p) = item else {
            continue;
        };
        // Type is checked before name for entity properties.
        let Some(type_name) = present(p.type_name.take()) else {
            return Err(CsdlError::EntityPropertyTypeRequired(name));
        };
        let Some(prop_name) = present(p.name.take()) else {
            return Err(CsdlError::EntityPropertyNameRequired(name));
        };
        properties.push(build_property(prop_name, type_name, p));
    }

    Ok(EntityType {
        name,
        properties,
        keys,
    })
}

fn read_complex_type(raw: RawComplexType) -> Result<ComplexType, CsdlError> {
    let name = present(raw.name).ok_or(CsdlError::ComplexTypeNameRequired)?;
    let mut properties = Vec::new();
    for item in raw.items {
        let RawStructuralItem::Property(mut p) = item else {
            continue;
        };
        let Some(prop_name) = present(p.name.take()) else {
            return Err(CsdlError::ComplexPropertyNameRequired(name));
        };
        let Some(type_name) = present(p.type_name.take()) else {
            return Err(CsdlError::ComplexPropertyTypeRequired {
                property: prop_name,
                complex_type: name,
            });
        };
        properties.push(build_property(prop_name, type_name, p));
    }
    Ok(ComplexType { name, properties })
}

fn read_function(raw: RawFunction) -> Result<Function, CsdlError> {
    let name = present(raw.name).ok_or(CsdlError::FunctionNameRequired)?;
    let Some(return_type) = present(raw.return_type.and_then(|r| r.type_name)) else {
        return Err(CsdlError::FunctionReturnTypeRequired(name));
    };

    let mut parameters = Vec::with_capacity(raw.parameters.len());
    for (idx, param) in raw.parameters.into_iter().enumerate() {
        let param_name = present(param.name).unwrap_or_else(|| format!("param{}", idx + 1));
        let Some(type_name) = present(param.type_name) else {
            return Err(CsdlError::ParameterTypeRequired {
                parameter: param_name,
                function: name,
            });
        };
        parameters.push(Parameter {
            name: param_name,
            type_name,
        });
    }

    Ok(Function {
        name,
        parameters,
        return_type,
    })
}

fn build_property(name: String, type_name: String, raw: RawProperty) -> Property {
    Property {
        name,
        kind: EdmKind::from_type_name(&type_name),
        type_name,
        nullable: raw.nullable.as_deref() != Some("false"),
        default_value: raw.default_value,
        max_length: raw.max_length.and_then(|v| v.parse().ok()),
        precision: raw.precision.and_then(|v| v.parse().ok()),
        scale: raw.scale.and_then(|v| v.parse().ok()),
    }
}
