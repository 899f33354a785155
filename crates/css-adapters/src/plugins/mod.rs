//! Plugins del motor de referencia.
//!
//! Un plugin recibe el árbol completo y un contexto donde dejar advertencias.
//! Puede suspenderse (`async`) y puede fallar con un error del motor; el motor
//! los ejecuta en el orden declarado.

pub mod builtin;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use css_core::{EngineError, ProcessOptions, Warning};

use crate::engine::ast::{Position, Root};

pub use builtin::{AsyncDoubler, Doubler, PluginSet, StripComments, WarnEmptyRules};

/// Estado compartido por los plugins de una invocación.
pub struct PluginContext<'a> {
    pub options: &'a ProcessOptions,
    current: String,
    warnings: Vec<Warning>,
}

impl<'a> PluginContext<'a> {
    pub fn new(options: &'a ProcessOptions) -> Self {
        Self { options, current: String::new(), warnings: Vec::new() }
    }

    pub(crate) fn enter(&mut self, plugin: &str) {
        self.current = plugin.to_string();
    }

    pub fn warn(&mut self, text: impl Into<String>, at: Option<Position>) {
        let mut warning = Warning::new(text).with_plugin(self.current.clone());
        if let Some(at) = at {
            warning = warning.at(at.line, at.column);
        }
        self.warnings.push(warning);
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[async_trait]
pub trait CssPlugin: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, root: &mut Root, ctx: &mut PluginContext<'_>) -> Result<(), EngineError>;
}

/// Forma en que el motor recibe los plugins: compartidos y reutilizables.
pub type SharedPlugin = Arc<dyn CssPlugin>;

impl fmt::Debug for dyn CssPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CssPlugin({})", self.name())
    }
}
