use crate::filter::{
    AttributesAccessor, DEFAULT_MAX_DEPTH, FieldKind, FieldSchema, FilterCompiler, KeyAccessor,
    PathAccessor,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// How field names are resolved against records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorKind {
    /// Top-level object key
    #[default]
    Key,
    /// Key inside the resource's `attributes` object
    Attributes,
    /// Separated path into nested objects and lists
    Path,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub accessor: AccessorKind,
    pub path_separator: char,
    pub max_depth: usize,
    /// Declared field types; when non-empty, filters are validated against them.
    pub fields: BTreeMap<String, FieldKind>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            accessor: AccessorKind::default(),
            path_separator: '.',
            max_depth: DEFAULT_MAX_DEPTH,
            fields: BTreeMap::new(),
        }
    }
}

impl FilterConfig {
    pub fn compiler(&self) -> FilterCompiler {
        let compiler = match self.accessor {
            AccessorKind::Key => FilterCompiler::with_accessor(KeyAccessor),
            AccessorKind::Attributes => FilterCompiler::with_accessor(AttributesAccessor),
            AccessorKind::Path => {
                FilterCompiler::with_accessor(PathAccessor::new(self.path_separator))
            }
        };
        compiler.max_depth(self.max_depth)
    }

    /// Field schema to validate filters against, if any fields are declared
    pub fn schema(&self) -> Option<FieldSchema> {
        let schema: FieldSchema = self
            .fields
            .iter()
            .map(|(name, kind)| (name.clone(), *kind))
            .collect();
        (!schema.is_empty()).then_some(schema)
    }

    /// Add or override field declarations
    pub fn declare_fields<I: IntoIterator<Item = (String, FieldKind)>>(&mut self, fields: I) {
        self.fields.extend(fields);
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FilterConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<FilterConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<FilterConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static FilterConfig {
    static DEFAULT_CONFIG: LazyLock<FilterConfig> = LazyLock::new(FilterConfig::default);
    &DEFAULT_CONFIG
}
