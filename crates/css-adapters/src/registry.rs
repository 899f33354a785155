//! Registro de plugins por nombre.
//!
//! Cada entrada es una fábrica que recibe las opciones JSON del plugin (o
//! `null`) y devuelve una instancia compartida. Lo usan el descubrimiento en
//! disco y la línea de comandos.
//!
//! `set` es especial: sus opciones `{"name": "...", "plugins": [...]}` se
//! resuelven contra el propio registro y producen un `PluginSet`.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::plugins::{AsyncDoubler, Doubler, PluginSet, SharedPlugin, StripComments, WarnEmptyRules};

pub type PluginFactory = fn(&Value) -> Result<SharedPlugin, String>;

pub const SET_PLUGIN: &str = "set";

const ENTRY_SHAPE: &str = "plugin entries must be \"name\" or [\"name\", options]";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown plugin \"{0}\"")]
    Unknown(String),
    #[error("invalid options for plugin \"{name}\": {reason}")]
    Options { name: String, reason: String },
    #[error("{0}")]
    Entry(String),
}

#[derive(Default, Clone)]
pub struct PluginRegistry {
    factories: IndexMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `doubler`, `async-doubler`, `strip-comments`, `warn-empty-rules`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("doubler", |_| Ok(Arc::new(Doubler)));
        registry.register("async-doubler", async_doubler);
        registry.register("strip-comments", strip_comments);
        registry.register("warn-empty-rules", |_| Ok(Arc::new(WarnEmptyRules)));
        registry
    }

    /// Registra o reemplaza una fábrica.
    pub fn register(&mut self, name: impl Into<String>, factory: PluginFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Nombres aceptados por `create`, en orden de registro y con `set` al final.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str).chain(std::iter::once(SET_PLUGIN))
    }

    pub fn create(&self, name: &str, options: &Value) -> Result<SharedPlugin, RegistryError> {
        if name == SET_PLUGIN && !self.factories.contains_key(SET_PLUGIN) {
            return self.create_set(options);
        }
        let factory = self.factories.get(name).ok_or_else(|| RegistryError::Unknown(name.to_string()))?;
        factory(options).map_err(|reason| RegistryError::Options { name: name.to_string(), reason })
    }

    /// Crea un plugin desde una entrada `"nombre"` o `["nombre", opciones]`.
    pub fn create_entry(&self, entry: &Value) -> Result<SharedPlugin, RegistryError> {
        match entry {
            Value::String(name) => self.create(name, &Value::Null),
            Value::Array(pair) => match pair.as_slice() {
                [Value::String(name)] => self.create(name, &Value::Null),
                [Value::String(name), options] => self.create(name, options),
                _ => Err(RegistryError::Entry(ENTRY_SHAPE.to_string())),
            },
            _ => Err(RegistryError::Entry(ENTRY_SHAPE.to_string())),
        }
    }

    fn create_set(&self, options: &Value) -> Result<SharedPlugin, RegistryError> {
        let label = options.get("name").and_then(Value::as_str).unwrap_or(SET_PLUGIN);
        let entries = options.get("plugins")
                             .and_then(Value::as_array)
                             .ok_or_else(|| RegistryError::Options { name: SET_PLUGIN.to_string(),
                                                                     reason: "\"plugins\" must be an array".into() })?;
        let plugins = entries.iter().map(|entry| self.create_entry(entry)).collect::<Result<Vec<_>, _>>()?;
        Ok(Arc::new(PluginSet::new(label, plugins)))
    }
}

fn async_doubler(options: &Value) -> Result<SharedPlugin, String> {
    let delay = match options.get("delay_ms") {
        None | Some(Value::Null) => 0,
        Some(v) => v.as_u64().ok_or("delay_ms must be a non-negative integer")?,
    };
    Ok(Arc::new(AsyncDoubler::new(Duration::from_millis(delay))))
}

fn strip_comments(options: &Value) -> Result<SharedPlugin, String> {
    let preserve_important = match options.get("preserve_important") {
        None | Some(Value::Null) => false,
        Some(v) => v.as_bool().ok_or("preserve_important must be a boolean")?,
    };
    Ok(Arc::new(StripComments { preserve_important }))
}
