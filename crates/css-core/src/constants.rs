/// Nombre con el que se etiquetan diagnósticos y errores estructurados.
pub const PLUGIN_NAME: &str = "cssflow";

/// Mensaje fijo para registros respaldados por stream.
pub const STREAMS_NOT_SUPPORTED: &str = "Streams are not supported!";

/// Claves de opción que el pipeline protege cuando encadena source maps.
pub const PROTECTED_WITH_SOURCE_MAP: [&str; 2] = ["from", "map"];
