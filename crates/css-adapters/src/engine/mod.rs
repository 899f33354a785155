//! Motor de referencia: parsea, ejecuta la cadena de plugins y serializa.
//!
//! Con `map` activo genera un source map v3 cuyo `file` es el nombre base de
//! `to` y cuyo único `source` es `from` relativo al directorio de `to`. Los
//! segmentos marcan el inicio de cada regla y de cada declaración.

pub mod ast;
pub mod parse;
pub mod stringify;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use css_core::model::source_map::encode_mappings;
use css_core::{paths, Engine, EngineError, EngineOutput, MapOption, ProcessOptions, SourceMap};
use log::debug;

use crate::plugins::{PluginContext, SharedPlugin};

/// Nombre de fuente cuando el CSS no viene de un archivo.
pub const NO_SOURCE: &str = "<no source>";

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine {
    /// Incluir `sourcesContent` en los mapas generados.
    pub sources_content: bool,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self { sources_content: true }
    }

    fn build_map(&self, css_in: &str, options: &ProcessOptions, mappings: &[Vec<css_core::model::Segment>]) -> SourceMap {
        let target = options.to.as_ref().or(options.from.as_ref());
        let file = target.and_then(|p| p.file_name())
                         .map(|n| n.to_string_lossy().into_owned())
                         .unwrap_or_default();
        let source = match (&options.from, target) {
            (Some(from), Some(to)) => paths::to_slash(&paths::relative(&paths::dirname(to), from)),
            (Some(from), None) => paths::to_slash(from),
            (None, _) => NO_SOURCE.to_string(),
        };

        let mut map = SourceMap::new(file);
        map.sources = vec![source];
        if self.sources_content {
            map.sources_content = Some(vec![Some(css_in.to_string())]);
        }
        map.mappings = encode_mappings(mappings);
        map
    }
}

fn annotation_for(options: &ProcessOptions) -> Option<String> {
    let target: &Path = options.to.as_deref().or(options.from.as_deref())?;
    let name = target.file_name()?.to_string_lossy();
    Some(format!("\n/*# sourceMappingURL={name}.map */"))
}

/// Los errores de sintaxis que lanza un plugin se atribuyen a él y heredan
/// archivo y entrada si no los traían.
fn attribute_to_plugin(err: EngineError, plugin: &str, from: Option<&str>, css: &str) -> EngineError {
    match err {
        EngineError::Syntax(mut syntax) => {
            if syntax.plugin.is_none() {
                syntax = syntax.with_plugin(plugin);
            }
            if syntax.file.is_none() {
                syntax = syntax.with_file(from.map(str::to_string));
            }
            if syntax.input.is_none() {
                syntax = syntax.with_input(css);
            }
            EngineError::Syntax(syntax)
        }
        other => other,
    }
}

#[async_trait]
impl Engine for RuleEngine {
    type Plugin = SharedPlugin;

    async fn process(&self, plugins: &[SharedPlugin], css: &str, options: &ProcessOptions) -> Result<EngineOutput, EngineError> {
        let from = options.from.as_ref().map(|p: &PathBuf| p.to_string_lossy().into_owned());
        let mut root = parse::parse(css, from.as_deref())?;

        let mut ctx = PluginContext::new(options);
        for plugin in plugins {
            debug!("rule-engine:plugin {}", plugin.name());
            ctx.enter(plugin.name());
            plugin.run(&mut root, &mut ctx)
                  .await
                  .map_err(|err| attribute_to_plugin(err, plugin.name(), from.as_deref(), css))?;
        }

        let out = stringify::stringify(&root, options.map.is_enabled());
        let mut result = EngineOutput { css: out.css, map: None, warnings: ctx.into_warnings() };

        if let MapOption::Detached { annotation } = options.map {
            result.map = Some(self.build_map(css, options, &out.mappings));
            if annotation {
                if let Some(comment) = annotation_for(options) {
                    result.css.push_str(&comment);
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::Doubler;
    use std::sync::Arc;

    fn opts(map: MapOption) -> ProcessOptions {
        let mut o = ProcessOptions::defaults_for("/p/src/fixture.css", false);
        o.map = map;
        o
    }

    #[tokio::test]
    async fn empty_chain_is_identity() {
        let css = "a {\n  color: red;\n}\n/* end */\n";
        let out = RuleEngine::new().process(&[], css, &opts(MapOption::Off)).await.unwrap();
        assert_eq!(out.css, css);
        assert!(out.map.is_none());
    }

    #[tokio::test]
    async fn two_doublers_quadruple() {
        let plugins: Vec<SharedPlugin> = vec![Arc::new(Doubler), Arc::new(Doubler)];
        let out = RuleEngine::new().process(&plugins, "a { color: black }", &opts(MapOption::Off)).await.unwrap();
        assert_eq!(out.css, "a { color: black; color: black; color: black; color: black }");
    }

    #[tokio::test]
    async fn detached_map_is_relative_to_target() {
        let plugins: Vec<SharedPlugin> = vec![Arc::new(Doubler)];
        let out = RuleEngine::new().process(&plugins, "a { color: black }", &opts(MapOption::detached())).await.unwrap();
        let map = out.map.unwrap();
        assert_eq!(map.file, "fixture.css");
        assert_eq!(map.sources, vec!["fixture.css"]);
        assert_eq!(map.mappings, "AAAA,IAAI,cAAA");
        assert_eq!(map.sources_content, Some(vec![Some("a { color: black }".to_string())]));
        assert!(!out.css.contains("sourceMappingURL"));
    }

    #[tokio::test]
    async fn annotation_appends_comment() {
        let out = RuleEngine::new().process(&[], "a {}", &opts(MapOption::Detached { annotation: true })).await.unwrap();
        assert_eq!(out.css, "a {}\n/*# sourceMappingURL=fixture.css.map */");
    }

    struct Rejects;

    #[async_trait]
    impl crate::plugins::CssPlugin for Rejects {
        fn name(&self) -> &str {
            "rejects"
        }

        async fn run(&self, _root: &mut ast::Root, _ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
            Err(css_core::CssSyntaxError::new("Unexpected value", 1, 5).into())
        }
    }

    #[tokio::test]
    async fn plugin_syntax_errors_name_the_plugin() {
        let plugins: Vec<SharedPlugin> = vec![Arc::new(Rejects)];
        let err = RuleEngine::new().process(&plugins, "a { b: c }", &opts(MapOption::Off)).await.unwrap_err();
        let EngineError::Syntax(err) = err else { panic!("expected syntax error") };
        assert_eq!(err.plugin.as_deref(), Some("rejects"));
        assert_eq!(err.file.as_deref(), Some("/p/src/fixture.css"));
        assert_eq!(err.input.as_deref(), Some("a { b: c }"));
        assert_eq!(err.message(), "rejects: /p/src/fixture.css:1:5: Unexpected value");
    }

    #[tokio::test]
    async fn syntax_error_carries_from_and_input() {
        let err = RuleEngine::new().process(&[], "a {", &opts(MapOption::Off)).await.unwrap_err();
        let EngineError::Syntax(err) = err else { panic!("expected syntax error") };
        assert_eq!(err.file.as_deref(), Some("/p/src/fixture.css"));
        assert_eq!(err.to_string(), "/p/src/fixture.css:1:1: Unclosed block");
    }
}
