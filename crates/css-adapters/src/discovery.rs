//! Descubrimiento de configuración en disco.
//!
//! Si la ruta de búsqueda es un archivo, ése es la configuración. Si es un
//! directorio, se busca en él y en sus ancestros el primero de
//! `.cssflowrc`, `.cssflowrc.json` o `cssflow.config.json`.
//!
//! Formato JSON:
//! ```json
//! { "plugins": ["doubler", ["strip-comments", {"preserve_important": true}]],
//!   "to": "out.css" }
//! ```
//! `plugins` también acepta un objeto `{ "nombre": opciones | false }`. La
//! entrada `["set", {"name": "...", "plugins": [...]}]` agrupa una cadena. El
//! resto de claves son opciones de procesamiento; sobre ellas se aplican las
//! opciones del contexto (salvo `config`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use css_core::{ConfigDiscovery, ConfigError, DiscoveryContext, ResolvedConfig};
use log::debug;
use serde_json::{Map, Value};

use crate::plugins::SharedPlugin;
use crate::registry::{PluginRegistry, RegistryError};

pub const CONFIG_FILE_NAMES: [&str; 3] = [".cssflowrc", ".cssflowrc.json", "cssflow.config.json"];

#[derive(Clone)]
pub struct FsConfigDiscovery {
    registry: Arc<PluginRegistry>,
}

impl FsConfigDiscovery {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// Localiza el archivo de configuración para `lookup`.
    pub async fn locate(&self, lookup: &Path) -> Result<PathBuf, ConfigError> {
        let not_found = || ConfigError::NotFound { search_from: lookup.to_path_buf() };
        let meta = tokio::fs::metadata(lookup).await.map_err(|_| not_found())?;
        if meta.is_file() {
            return Ok(lookup.to_path_buf());
        }
        for dir in lookup.ancestors() {
            for name in CONFIG_FILE_NAMES {
                let candidate = dir.join(name);
                if tokio::fs::metadata(&candidate).await.map(|m| m.is_file()).unwrap_or(false) {
                    debug!("discovery:found {}", candidate.display());
                    return Ok(candidate);
                }
            }
        }
        Err(not_found())
    }

    pub async fn load(&self, path: &Path) -> Result<ResolvedConfig<SharedPlugin>, ConfigError> {
        let raw = tokio::fs::read_to_string(path).await
                                                 .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        parse_config(&raw, path, &self.registry)
    }
}

fn invalid(path: &Path, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { path: path.to_path_buf(), reason: reason.into() }
}

fn registry_error(path: &Path, err: RegistryError) -> ConfigError {
    match err {
        RegistryError::Unknown(name) => ConfigError::UnknownPlugin { name },
        other => invalid(path, other.to_string()),
    }
}

/// Interpreta el contenido de un archivo de configuración.
pub fn parse_config(raw: &str, path: &Path, registry: &PluginRegistry) -> Result<ResolvedConfig<SharedPlugin>, ConfigError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| invalid(path, e.to_string()))?;
    let Value::Object(mut object) = value else {
        return Err(invalid(path, "top level must be an object"));
    };

    let mut plugins = Vec::new();
    match object.remove("plugins") {
        None | Some(Value::Null) => {}
        Some(Value::Array(entries)) => {
            for entry in &entries {
                plugins.push(registry.create_entry(entry).map_err(|e| registry_error(path, e))?);
            }
        }
        Some(Value::Object(entries)) => {
            for (name, options) in entries {
                if options == Value::Bool(false) {
                    continue;
                }
                plugins.push(registry.create(&name, &options).map_err(|e| registry_error(path, e))?);
            }
        }
        Some(_) => return Err(invalid(path, "\"plugins\" must be an array or an object")),
    }

    Ok(ResolvedConfig::new(plugins, object))
}

#[async_trait]
impl ConfigDiscovery<SharedPlugin> for FsConfigDiscovery {
    async fn discover(&self, ctx: DiscoveryContext<'_>, lookup: &Path) -> Result<ResolvedConfig<SharedPlugin>, ConfigError> {
        let path = self.locate(lookup).await?;
        let mut resolved = self.load(&path).await?;
        let overrides: Map<String, Value> = ctx.options
                                               .iter()
                                               .filter(|(k, _)| k.as_str() != "config")
                                               .map(|(k, v)| (k.clone(), v.clone()))
                                               .collect();
        resolved.options.extend(overrides);
        debug!("discovery:loaded {} plugins={} file={}",
               path.display(),
               resolved.plugins.len(),
               ctx.file.path().display());
        Ok(resolved)
    }
}
