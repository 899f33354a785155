//! Merge determinista de opciones de procesamiento.
//!
//! Semántica: cada clave de las opciones resueltas sobreescribe el default
//! del pipeline (incluida `to`), salvo las claves protegidas, que se descartan
//! y se reportan. La protección sólo depende de si el archivo ya trae un
//! source map, nunca de la forma de configuración que produjo las opciones.

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::constants::PROTECTED_WITH_SOURCE_MAP;
use crate::model::options::{MapOption, ProcessOptions};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtectedKeys {
    from: bool,
    map: bool,
}

impl ProtectedKeys {
    /// `{from, map}` cuando el archivo ya trae source map, vacío en otro caso.
    pub fn for_file(has_source_map: bool) -> Self {
        Self { from: has_source_map, map: has_source_map }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        match key {
            "from" => self.from,
            "map" => self.map,
            _ => false,
        }
    }

    pub fn keys(&self) -> Vec<&'static str> {
        PROTECTED_WITH_SOURCE_MAP.iter().copied().filter(|k| self.contains(k)).collect()
    }
}

/// Clave de las opciones resueltas que no se aplicó.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Protected(String),
    InvalidValue(String),
}

impl Rejection {
    /// Texto del diagnóstico para el reporter, con la ruta relativa del archivo.
    pub fn diagnostic(&self, relative: &str) -> String {
        match self {
            Rejection::Protected(key) => {
                format!("Cannot override \"{key}\" option because it is required by source maps ({relative})")
            }
            Rejection::InvalidValue(key) => {
                format!("Ignoring \"{key}\" option because its value has an unsupported type ({relative})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub options: ProcessOptions,
    pub rejected: Vec<Rejection>,
}

fn path_value(value: &Value) -> Option<Option<PathBuf>> {
    match value {
        Value::String(s) => Some(Some(PathBuf::from(s))),
        Value::Null => Some(None),
        _ => None,
    }
}

pub fn merge_options(base: ProcessOptions, resolved: &Map<String, Value>, protected: ProtectedKeys) -> MergeOutcome {
    let mut options = base;
    let mut rejected = Vec::new();

    for (key, value) in resolved.iter() {
        if protected.contains(key) {
            rejected.push(Rejection::Protected(key.clone()));
            continue;
        }
        let applied = match key.as_str() {
            "from" => path_value(value).map(|p| options.from = p).is_some(),
            "to" => path_value(value).map(|p| options.to = p).is_some(),
            "map" => MapOption::from_value(value).map(|m| options.map = m).is_some(),
            _ => {
                options.extra.insert(key.clone(), value.clone());
                true
            }
        };
        if !applied {
            rejected.push(Rejection::InvalidValue(key.clone()));
        }
    }

    MergeOutcome { options, rejected }
}
