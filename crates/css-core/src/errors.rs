//! Errores del core.
//!
//! - `CssSyntaxError`: error posicional reportado por el motor.
//! - `EngineError`, `ConfigError`, `SourceMapError`: fallos por etapa.
//! - `TransformError`: cualquier fallo de un archivo, etiquetado por etapa.
//! - `PluginError`: forma estructurada que recibe el canal de errores del stream.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::constants::STREAMS_NOT_SUPPORTED;

/// Error opaco de un colaborador externo.
pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssSyntaxError {
    pub reason: String,
    /// Archivo reportado por el motor (normalmente la opción `from`).
    pub file: Option<String>,
    /// Base 1.
    pub line: u32,
    /// Base 1.
    pub column: u32,
    /// Texto CSS completo sobre el que se produjo el error.
    pub input: Option<String>,
    pub plugin: Option<String>,
}

impl CssSyntaxError {
    pub fn new(reason: impl Into<String>, line: u32, column: u32) -> Self {
        Self { reason: reason.into(),
               file: None,
               line,
               column,
               input: None,
               plugin: None }
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// `plugin: file:line:column: reason`
    pub fn message(&self) -> String {
        let mut out = String::new();
        if let Some(plugin) = &self.plugin {
            out.push_str(plugin);
            out.push_str(": ");
        }
        out.push_str(self.file.as_deref().unwrap_or("<css input>"));
        out.push_str(&format!(":{}:{}: {}", self.line, self.column, self.reason));
        out
    }

    /// Fragmento del CSS alrededor del error, con numeración y un `^` bajo la
    /// columna. Vacío cuando no se conoce el texto de entrada.
    pub fn show_source_code(&self) -> String {
        let Some(input) = &self.input else {
            return String::new();
        };
        let lines: Vec<&str> = input.split('\n').collect();
        let line = self.line.max(1) as usize;
        let start = line.saturating_sub(3);
        let end = (line + 2).min(lines.len());
        let max_width = end.to_string().len();

        let mut out = Vec::new();
        for (index, text) in lines.iter().enumerate().take(end).skip(start) {
            let number = index + 1;
            let gutter = format!(" {:>width$} | ", number, width = max_width);
            if number == line {
                let col = self.column.saturating_sub(1) as usize;
                let pad: String = text.chars()
                                      .take(col)
                                      .map(|c| if c == '\t' { '\t' } else { ' ' })
                                      .collect();
                let spacing: String = gutter.chars().map(|c| if c.is_ascii_digit() { ' ' } else { c }).collect();
                out.push(format!(">{gutter}{text}\n {spacing}{pad}^"));
            } else {
                out.push(format!(" {gutter}{text}"));
            }
        }
        out.join("\n")
    }
}

impl fmt::Display for CssSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl StdError for CssSyntaxError {}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Syntax(#[from] CssSyntaxError),
    #[error(transparent)]
    Other(BoxError),
}

impl EngineError {
    pub fn other(err: impl Into<BoxError>) -> Self {
        EngineError::Other(err.into())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceMapError {
    #[error("engine returned no source map although one was requested")]
    NotGenerated,
    #[error("source map is missing required property \"{0}\"")]
    MissingProperty(&'static str),
    #[error("invalid source map mappings at byte {0}")]
    InvalidMappings(usize),
    #[error("malformed source map: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration found in {} or its parents", .search_from.display())]
    NotFound { search_from: PathBuf },
    #[error("Failed to read configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
    #[error("Unknown plugin \"{name}\"")]
    UnknownPlugin { name: String },
    #[error(transparent)]
    Callback(BoxError),
}

/// Fallo de un archivo en cualquier etapa de su cadena.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{}", STREAMS_NOT_SUPPORTED)]
    StreamsNotSupported,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    SourceMap(#[from] SourceMapError),
    /// La tarea que procesaba el archivo terminó sin señalar (p. ej. pánico).
    #[error("Transform aborted: {0}")]
    Aborted(String),
}

impl TransformError {
    pub fn stage(&self) -> &'static str {
        match self {
            TransformError::StreamsNotSupported => "input",
            TransformError::Config(_) => "config",
            TransformError::Engine(_) => "engine",
            TransformError::SourceMap(_) => "sourcemap",
            TransformError::Aborted(_) => "task",
        }
    }

    pub fn as_syntax(&self) -> Option<&CssSyntaxError> {
        match self {
            TransformError::Engine(EngineError::Syntax(e)) => Some(e),
            _ => None,
        }
    }
}

/// Error estructurado entregado al canal de errores del stream.
#[derive(Debug)]
pub struct PluginError {
    pub plugin_name: String,
    pub message: String,
    pub file_name: String,
    pub line_number: Option<u32>,
    pub column: Option<u32>,
    pub show_stack: bool,
    pub show_properties: bool,
    /// Motivo corto de un error de sintaxis (sin posición).
    pub reason: Option<String>,
    /// CSS de entrada sobre el que falló el motor.
    pub source_text: Option<String>,
    /// Fragmento renderizado por `CssSyntaxError::show_source_code`.
    pub source_excerpt: Option<String>,
    pub cause: Option<TransformError>,
}

impl PluginError {
    pub fn is_syntax_error(&self) -> bool {
        self.cause.as_ref().and_then(TransformError::as_syntax).is_some()
    }
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error in plugin \"{}\"", self.plugin_name)?;
        writeln!(f, "Message:")?;
        for line in self.message.trim_end().lines() {
            writeln!(f, "    {line}")?;
        }
        if self.show_properties {
            writeln!(f, "Details:")?;
            writeln!(f, "    fileName: {}", self.file_name)?;
            if let Some(line) = self.line_number {
                writeln!(f, "    lineNumber: {line}")?;
            }
            if let Some(column) = self.column {
                writeln!(f, "    column: {column}")?;
            }
        }
        if self.show_stack {
            let mut next = self.cause.as_ref().and_then(|c| c.source());
            if next.is_some() {
                writeln!(f, "Caused by:")?;
            }
            while let Some(err) = next {
                writeln!(f, "    {err}")?;
                next = err.source();
            }
        }
        Ok(())
    }
}

impl StdError for PluginError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|c| c as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_message_uses_file_or_placeholder() {
        let err = CssSyntaxError::new("Unclosed block", 1, 1);
        assert_eq!(err.message(), "<css input>:1:1: Unclosed block");
        let err = err.with_file(Some("/p/a.css".into()));
        assert_eq!(err.to_string(), "/p/a.css:1:1: Unclosed block");
    }

    #[test]
    fn source_excerpt_marks_column() {
        let err = CssSyntaxError::new("Unclosed block", 1, 1).with_input("a {");
        assert_eq!(err.show_source_code(), "> 1 | a {\n    | ^");
    }

    #[test]
    fn source_excerpt_keeps_surrounding_lines() {
        let input = "a {}\nb {}\nc { color\nd {}";
        let err = CssSyntaxError::new("Unknown word", 3, 5).with_input(input);
        let excerpt = err.show_source_code();
        assert_eq!(excerpt, "  1 | a {}\n  2 | b {}\n> 3 | c { color\n    |     ^\n  4 | d {}");
    }

    #[test]
    fn excerpt_is_empty_without_input() {
        assert!(CssSyntaxError::new("x", 1, 1).show_source_code().is_empty());
    }

    #[test]
    fn streams_error_message_is_fixed() {
        assert_eq!(TransformError::StreamsNotSupported.to_string(), "Streams are not supported!");
        assert_eq!(TransformError::StreamsNotSupported.stage(), "input");
    }
}
