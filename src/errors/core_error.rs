use css_core::SourceMapError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error de source map: {0}")]
    SourceMap(#[from] SourceMapError),
    #[error("{failed} de {total} archivos fallaron")]
    Failed { failed: usize, total: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_variant_from() {
        let io_err = std::io::Error::other("falló IO");
        let err: CoreError = io_err.into();
        assert_eq!(err.to_string(), "Error en IO: falló IO");
    }

    #[test]
    fn test_config_variant_format() {
        let err = CoreError::Config("unknown plugin \"x\"".into());
        assert_eq!(err.to_string(), "Error de configuración: unknown plugin \"x\"");
    }

    #[test]
    fn test_failed_variant_format() {
        let err = CoreError::Failed { failed: 2, total: 5 };
        assert_eq!(err.to_string(), "2 de 5 archivos fallaron");
    }

    #[test]
    fn test_source_map_variant_from() {
        let err: CoreError = SourceMapError::MissingProperty("file").into();
        assert_eq!(err.to_string(), "Error de source map: source map is missing required property \"file\"");
    }
}
