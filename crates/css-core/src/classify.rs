//! Conversión de un fallo por archivo en `PluginError`.

use crate::constants::PLUGIN_NAME;
use crate::errors::{PluginError, TransformError};
use crate::model::FileRecord;

/// Errores de sintaxis: posición + fragmento, sin stack. Resto: mensaje
/// original con su cadena de causas y sin posición.
pub fn classify(err: TransformError, file: &FileRecord) -> PluginError {
    let path = file.path().to_string_lossy().into_owned();

    let syntax = err.as_syntax().map(|syntax| {
        let excerpt = syntax.show_source_code();
        (format!("{}\n\n{}\n", syntax.message(), excerpt), syntax.clone(), excerpt)
    });
    if let Some((message, syntax, excerpt)) = syntax {
        return PluginError { plugin_name: PLUGIN_NAME.to_string(),
                             message,
                             file_name: syntax.file.unwrap_or(path),
                             line_number: Some(syntax.line),
                             column: Some(syntax.column),
                             show_stack: false,
                             show_properties: false,
                             reason: Some(syntax.reason),
                             source_text: syntax.input,
                             source_excerpt: Some(excerpt),
                             cause: Some(err) };
    }

    PluginError { plugin_name: PLUGIN_NAME.to_string(),
                  message: err.to_string(),
                  file_name: path,
                  line_number: None,
                  column: None,
                  show_stack: true,
                  show_properties: true,
                  reason: None,
                  source_text: None,
                  source_excerpt: None,
                  cause: Some(err) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ConfigError, CssSyntaxError, EngineError};

    fn file() -> FileRecord {
        FileRecord::from_text("/p", "/p/fixture.css", "a {")
    }

    #[test]
    fn syntax_errors_get_position_and_excerpt() {
        let syntax = CssSyntaxError::new("Unclosed block", 1, 1).with_input("a {");
        let err = classify(TransformError::Engine(EngineError::Syntax(syntax)), &file());
        assert!(!err.show_stack);
        assert!(!err.show_properties);
        assert_eq!(err.line_number, Some(1));
        assert_eq!(err.column, Some(1));
        assert_eq!(err.file_name, "/p/fixture.css");
        assert_eq!(err.message, "<css input>:1:1: Unclosed block\n\n> 1 | a {\n    | ^\n");
        assert!(err.is_syntax_error());
    }

    #[test]
    fn syntax_error_prefers_engine_reported_file() {
        let syntax = CssSyntaxError::new("Unknown word", 2, 3).with_file(Some("/elsewhere.css".into()));
        let err = classify(TransformError::Engine(EngineError::Syntax(syntax)), &file());
        assert_eq!(err.file_name, "/elsewhere.css");
    }

    #[test]
    fn other_errors_keep_message_and_stack() {
        let err = classify(TransformError::Config(ConfigError::Callback("boom".into())), &file());
        assert!(err.show_stack);
        assert_eq!(err.message, "boom");
        assert_eq!(err.line_number, None);
        assert_eq!(err.file_name, "/p/fixture.css");
        assert_eq!(err.plugin_name, "cssflow");
        assert!(!err.is_syntax_error());
    }
}
