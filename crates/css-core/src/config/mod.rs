//! Resolución de configuración por archivo.
//!
//! La configuración llega en una de tres formas, fijadas al construir el
//! transform:
//! - `Plugins`: lista explícita de plugins + opciones.
//! - `Callback`: función por archivo que devuelve `{plugins, options}`.
//! - `Discover`: opciones libres (con `config` opcional) que se entregan al
//!   colaborador de descubrimiento en disco.
//!
//! La resolución ocurre una vez por archivo y nunca se cachea entre archivos.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::{Map, Value};

use crate::errors::{BoxError, ConfigError};
use crate::model::FileRecord;
use crate::paths;

/// `{pluginChain, options}` resuelto para un archivo.
#[derive(Debug, Clone)]
pub struct ResolvedConfig<P> {
    pub plugins: Vec<P>,
    pub options: Map<String, Value>,
}

impl<P> ResolvedConfig<P> {
    pub fn new(plugins: Vec<P>, options: Map<String, Value>) -> Self {
        Self { plugins, options }
    }
}

impl<P> Default for ResolvedConfig<P> {
    fn default() -> Self {
        Self { plugins: Vec::new(), options: Map::new() }
    }
}

/// Callback por archivo. Las closures síncronas lo implementan
/// automáticamente; las asíncronas implementan el trait a mano.
#[async_trait]
pub trait ConfigCallback<P>: Send + Sync {
    async fn resolve(&self, file: &FileRecord) -> Result<ResolvedConfig<P>, BoxError>;
}

#[async_trait]
impl<P, F> ConfigCallback<P> for F
    where F: Fn(&FileRecord) -> Result<ResolvedConfig<P>, BoxError> + Send + Sync,
          P: Send + 'static
{
    async fn resolve(&self, file: &FileRecord) -> Result<ResolvedConfig<P>, BoxError> {
        (self)(file)
    }
}

/// Contexto que recibe el colaborador de descubrimiento.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryContext<'a> {
    pub file: &'a FileRecord,
    pub options: &'a Map<String, Value>,
}

/// Colaborador externo que encuentra y carga configuración en disco.
#[async_trait]
pub trait ConfigDiscovery<P>: Send + Sync {
    async fn discover(&self, ctx: DiscoveryContext<'_>, lookup: &Path) -> Result<ResolvedConfig<P>, ConfigError>;
}

pub enum ConfigSource<P> {
    Plugins {
        plugins: Vec<P>,
        options: Map<String, Value>,
    },
    Callback(Arc<dyn ConfigCallback<P>>),
    Discover {
        options: Map<String, Value>,
        discovery: Arc<dyn ConfigDiscovery<P>>,
    },
}

impl<P> ConfigSource<P> {
    pub fn plugins(plugins: Vec<P>) -> Self {
        ConfigSource::Plugins { plugins, options: Map::new() }
    }

    /// Lista explícita con opciones separadas.
    pub fn plugins_with_options(plugins: Vec<P>, options: Map<String, Value>) -> Self {
        ConfigSource::Plugins { plugins, options }
    }

    pub fn callback(callback: impl ConfigCallback<P> + 'static) -> Self {
        ConfigSource::Callback(Arc::new(callback))
    }

    /// Callback síncrono a partir de una closure.
    pub fn from_fn<F>(f: F) -> Self
        where F: Fn(&FileRecord) -> Result<ResolvedConfig<P>, BoxError> + Send + Sync + 'static,
              P: Send + 'static
    {
        ConfigSource::Callback(Arc::new(f))
    }

    pub fn discover(options: Map<String, Value>, discovery: Arc<dyn ConfigDiscovery<P>>) -> Self {
        ConfigSource::Discover { options, discovery }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ConfigSource::Plugins { .. } => "plugins",
            ConfigSource::Callback(_) => "callback",
            ConfigSource::Discover { .. } => "discover",
        }
    }
}

impl<P: Clone + Send + Sync> ConfigSource<P> {
    pub async fn resolve(&self, file: &FileRecord) -> Result<ResolvedConfig<P>, ConfigError> {
        debug!("config:resolve kind={} file={}", self.kind(), file.path().display());
        match self {
            ConfigSource::Plugins { plugins, options } => Ok(ResolvedConfig::new(plugins.clone(), options.clone())),
            ConfigSource::Callback(callback) => callback.resolve(file).await.map_err(ConfigError::Callback),
            ConfigSource::Discover { options, discovery } => {
                let lookup = lookup_path(options, file)?;
                debug!("config:discover lookup={}", lookup.display());
                discovery.discover(DiscoveryContext { file, options }, &lookup).await
            }
        }
    }
}

/// Dónde buscar configuración en disco: `config` absoluto tal cual, relativo
/// unido a `base`, y si falta, el directorio del propio archivo. Un `config`
/// que no es texto es un error.
pub fn lookup_path(options: &Map<String, Value>, file: &FileRecord) -> Result<PathBuf, ConfigError> {
    match options.get("config") {
        None | Some(Value::Null) => Ok(file.dirname()),
        Some(Value::String(config)) if Path::new(config).is_absolute() => Ok(PathBuf::from(config)),
        Some(Value::String(config)) => Ok(paths::join(file.base(), config)),
        Some(other) => Err(ConfigError::Invalid { path: file.path().to_path_buf(),
                                                  reason: format!("\"config\" option must be a path, got {other}") }),
    }
}
