use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use odata_csdl::{EdmKind, SchemaModel, parse_csdl};
use odata_filter::{FilterPipeline, PropertyMap};
use tracing::info;

use crate::config::AppConfig;

fn load_schema(config: &AppConfig) -> Result<SchemaModel> {
    let Some(path) = config.csdl.as_deref() else {
        bail!("no CSDL document given (use --csdl or set `csdl` in the config)");
    };
    read_schema(path)
}

fn read_schema(path: &Path) -> Result<SchemaModel> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read CSDL document {}", path.display()))?;
    let schema = parse_csdl(&text)
        .with_context(|| format!("failed to load CSDL document {}", path.display()))?;
    info!(
        path = %path.display(),
        entity_types = schema.entity_types.len(),
        complex_types = schema.complex_types.len(),
        "schema loaded"
    );
    Ok(schema)
}

/// Compile `filter` for `entity_set` and print the result as JSON.
pub fn compile(config: &AppConfig, entity_set: &str, filter: &str) -> Result<()> {
    let schema = load_schema(config)?;
    let pipeline = FilterPipeline::new(
        Arc::new(schema),
        config.functions.clone(),
        config.properties.clone(),
    )
    .with_options(config.filter.clone());

    let result = pipeline.process(filter, entity_set)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Validate the configuration and, when one is configured, the CSDL document.
pub fn check(config: &AppConfig) -> Result<()> {
    info!("checking configuration");
    config.validate()?;
    if config.csdl.is_some() {
        let schema = load_schema(config)?;
        let dangling: Vec<_> = schema
            .containers
            .iter()
            .flat_map(|c| &c.entity_sets)
            .filter(|set| schema.entity_type(&set.entity_type).is_none())
            .map(|set| set.name.as_str())
            .collect();
        if !dangling.is_empty() {
            bail!(
                "entity sets reference undeclared entity types: {}",
                dangling.join(", ")
            );
        }
    }
    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

/// Print the flattened property paths of an entity type, or a property map
/// skeleton when `as_mapping` is set.
pub fn schema(
    config: &AppConfig,
    entity_type: &str,
    kind: Option<&str>,
    as_mapping: bool,
) -> Result<()> {
    let schema = load_schema(config)?;
    if schema.entity_type(entity_type).is_none() {
        return Err(anyhow!("EntityType '{entity_type}' not found in the CSDL model."));
    }
    let only = kind.map(EdmKind::from_type_name);
    let flattened = schema.flatten_entity_properties(entity_type, only);

    if as_mapping {
        let map = PropertyMap::from_flattened(&flattened);
        print!("{}", serde_saphyr::to_string(&map).context("failed to render property map")?);
    } else {
        for property in &flattened {
            println!("{}\t{}", property.path, property.type_name);
        }
    }
    Ok(())
}
