//! Opciones de procesamiento entregadas al motor.
//!
//! Tres claves están reservadas por el pipeline (`from`, `to`, `map`) y tienen
//! forma fija; el resto de claves se transportan tal cual en `extra`.

use std::path::PathBuf;

use serde_json::{Map, Value};

/// Generación de source map solicitada al motor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOption {
    Off,
    /// Mapa separado del CSS; `annotation` añade el comentario `sourceMappingURL`.
    Detached { annotation: bool },
}

impl MapOption {
    /// Mapa separado y sin anotación: lo que necesita el encadenamiento de mapas.
    pub fn detached() -> Self {
        MapOption::Detached { annotation: false }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, MapOption::Off)
    }

    /// Interpreta el valor JSON de una opción `map` de usuario.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Bool(false) => Some(MapOption::Off),
            Value::Bool(true) => Some(MapOption::Detached { annotation: true }),
            Value::Object(obj) => {
                let annotation = match obj.get("annotation") {
                    None => true,
                    Some(Value::Bool(b)) => *b,
                    Some(_) => return None,
                };
                Some(MapOption::Detached { annotation })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    pub from: Option<PathBuf>,
    pub to: Option<PathBuf>,
    pub map: MapOption,
    /// Opciones no reservadas, pasadas al motor sin inspección.
    pub extra: Map<String, Value>,
}

impl ProcessOptions {
    /// Valores por defecto del pipeline para un archivo: `from` y `to` apuntan
    /// a su ruta; el mapa se genera separado sólo si ya trae uno.
    pub fn defaults_for(path: impl Into<PathBuf>, has_source_map: bool) -> Self {
        let path = path.into();
        Self { from: Some(path.clone()),
               to: Some(path),
               map: if has_source_map { MapOption::detached() } else { MapOption::Off },
               extra: Map::new() }
    }
}
