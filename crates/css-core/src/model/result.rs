use std::fmt;

use crate::model::source_map::SourceMap;

/// Diagnóstico no fatal emitido por el motor o por un plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub text: String,
    pub plugin: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl Warning {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), plugin: None, line: None, column: None }
    }

    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plugin {
            Some(plugin) => write!(f, "{plugin}: {}", self.text),
            None => f.write_str(&self.text),
        }
    }
}

/// Resultado de una invocación del motor; se consume inmediatamente para
/// actualizar el registro.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub css: String,
    pub map: Option<SourceMap>,
    pub warnings: Vec<Warning>,
}

impl EngineOutput {
    pub fn passthrough(css: impl Into<String>) -> Self {
        Self { css: css.into(), ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_display_prefixes_plugin() {
        assert_eq!(Warning::new("msg1").to_string(), "msg1");
        assert_eq!(Warning::new("empty rule").with_plugin("warn-empty").to_string(), "warn-empty: empty rule");
    }
}
