use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use odata_filter::{FilterOptions, FunctionCatalog, PropertyMap};
use serde::{Deserialize, Serialize};

/// Environment variables with this prefix override config keys, with `__`
/// separating nested keys (`ODATA_FILTER__FILTER__SOURCE_SRID=28992`).
pub const ENV_PREFIX: &str = "ODATA_FILTER__";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub filter: FilterOptions,
    pub functions: FunctionCatalog,
    pub properties: PropertyMap,
    /// CSDL document used when `--csdl` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csdl: Option<PathBuf>,
}

/// Values given on the command line; they win over every other layer.
#[derive(Clone, Debug, Default)]
pub struct CliOverrides {
    pub parameter_prefix: Option<char>,
    pub source_srid: Option<i32>,
    pub csdl: Option<PathBuf>,
}

impl AppConfig {
    /// Layered load: defaults, then the YAML file (if any), then
    /// `ODATA_FILTER__*` environment variables.
    ///
    /// # Errors
    /// Fails when the file does not exist or a layer does not fit the
    /// config shape.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Some(path) = path {
            if !path.is_file() {
                bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")
    }

    pub fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(prefix) = overrides.parameter_prefix {
            self.filter.parameter_prefix = prefix;
        }
        if let Some(srid) = overrides.source_srid {
            self.filter.source_srid = srid;
        }
        if let Some(csdl) = &overrides.csdl {
            self.csdl = Some(csdl.clone());
        }
    }

    /// Semantic checks that deserialization cannot express.
    ///
    /// # Errors
    /// Unsupported source SRID, a zero length limit, or catalog entries with
    /// blank names or templates.
    pub fn validate(&self) -> Result<()> {
        if !odata_geo::is_supported(self.filter.source_srid) {
            bail!(
                "filter.source_srid {} is not a supported coordinate system",
                self.filter.source_srid
            );
        }
        if self.filter.max_filter_length == 0 {
            bail!("filter.max_filter_length must be greater than zero");
        }
        for function in &self.functions {
            if function.name.trim().is_empty() || function.sql_template.trim().is_empty() {
                bail!("function entries need a name and an sql_template");
            }
        }
        for property in &self.properties {
            if property.property.trim().is_empty() || property.query.trim().is_empty() {
                bail!("property entries need a property and a query");
            }
        }
        Ok(())
    }

    /// # Errors
    /// Serialization failure.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).context("failed to render configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn yaml_layer_is_merged_over_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "filter.yaml",
                r"
filter:
  source_srid: 28992
functions:
  - name: startswith
    sql_template: 'ILIKE({0}, {1})'
    argument_types: [Edm.String, Edm.String]
    return_type: Edm.String
    wildcard_position: right
properties:
  - property: Name
    query: name
    edm_type: Edm.String
",
            )?;

            let config = AppConfig::load(Some(Path::new("filter.yaml"))).unwrap();

            assert_eq!(config.filter.source_srid, 28992);
            assert_eq!(config.filter.parameter_prefix, '@');
            assert_eq!(config.functions.len(), 1);
            assert_eq!(config.properties.get("name").unwrap().query, "name");
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file("filter.yaml", "filter:\n  source_srid: 28992\n")?;
            jail.set_env("ODATA_FILTER__FILTER__SOURCE_SRID", "25831");

            let config = AppConfig::load(Some(Path::new("filter.yaml"))).unwrap();

            assert_eq!(config.filter.source_srid, 25831);
            Ok(())
        });
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = AppConfig::default();

        config.apply_cli_overrides(&CliOverrides {
            parameter_prefix: Some(':'),
            source_srid: Some(4326),
            csdl: Some(PathBuf::from("model.xml")),
        });

        assert_eq!(config.filter.parameter_prefix, ':');
        assert_eq!(config.filter.source_srid, 4326);
        assert_eq!(config.csdl.as_deref(), Some(Path::new("model.xml")));
    }

    #[test]
    fn unsupported_srid_fails_validation() {
        let mut config = AppConfig::default();
        config.filter.source_srid = 2154;

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("2154"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/filter.yaml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
