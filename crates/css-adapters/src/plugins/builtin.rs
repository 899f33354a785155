use std::time::Duration;

use async_trait::async_trait;
use css_core::EngineError;
use log::debug;

use super::{CssPlugin, PluginContext, SharedPlugin};
use crate::engine::ast::{walk_rules, walk_rules_mut, Node, Root};

fn double_declarations(root: &mut Root) {
    walk_rules_mut(&mut root.nodes, &mut |rule| {
        let mut doubled = Vec::with_capacity(rule.nodes.len() * 2);
        for node in rule.nodes.drain(..) {
            if let Node::Decl(decl) = &node {
                doubled.push(Node::Decl(decl.clone()));
            }
            doubled.push(node);
        }
        rule.nodes = doubled;
    });
}

/// Antepone a cada declaración una copia de sí misma.
#[derive(Debug, Clone, Copy, Default)]
pub struct Doubler;

#[async_trait]
impl CssPlugin for Doubler {
    fn name(&self) -> &str {
        "doubler"
    }

    async fn run(&self, root: &mut Root, _ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        double_declarations(root);
        Ok(())
    }
}

/// Igual que `Doubler`, pero cede el control antes de tocar el árbol.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncDoubler {
    pub delay: Duration,
}

impl AsyncDoubler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl CssPlugin for AsyncDoubler {
    fn name(&self) -> &str {
        "async-doubler"
    }

    async fn run(&self, root: &mut Root, _ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
        double_declarations(root);
        Ok(())
    }
}

/// Elimina comentarios; con `preserve_important` conserva los `/*! */`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripComments {
    pub preserve_important: bool,
}

fn strip(nodes: &mut Vec<Node>, preserve_important: bool) {
    nodes.retain(|node| match node {
        Node::Comment(c) => preserve_important && c.is_important(),
        _ => true,
    });
    for node in nodes.iter_mut() {
        if let Node::Rule(rule) = node {
            strip(&mut rule.nodes, preserve_important);
        }
    }
}

#[async_trait]
impl CssPlugin for StripComments {
    fn name(&self) -> &str {
        "strip-comments"
    }

    async fn run(&self, root: &mut Root, _ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        strip(&mut root.nodes, self.preserve_important);
        Ok(())
    }
}

/// Advierte por cada regla sin hijos.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarnEmptyRules;

#[async_trait]
impl CssPlugin for WarnEmptyRules {
    fn name(&self) -> &str {
        "warn-empty-rules"
    }

    async fn run(&self, root: &mut Root, ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        let mut empty = Vec::new();
        walk_rules(&root.nodes, &mut |rule| {
            if rule.nodes.is_empty() {
                empty.push((rule.selector.clone(), rule.source));
            }
        });
        for (selector, at) in empty {
            ctx.warn(format!("Empty rule \"{selector}\""), at);
        }
        Ok(())
    }
}

/// Cadena preconstruida y reutilizable que se comporta como un único plugin.
#[derive(Clone)]
pub struct PluginSet {
    name: String,
    plugins: Vec<SharedPlugin>,
}

impl PluginSet {
    pub fn new(name: impl Into<String>, plugins: Vec<SharedPlugin>) -> Self {
        Self { name: name.into(), plugins }
    }
}

#[async_trait]
impl CssPlugin for PluginSet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, root: &mut Root, ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        for plugin in &self.plugins {
            debug!("plugin-set:{} run {}", self.name, plugin.name());
            ctx.enter(plugin.name());
            plugin.run(root, ctx).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{parse::parse, stringify::stringify};
    use css_core::ProcessOptions;
    use std::sync::Arc;

    async fn apply(plugin: &dyn CssPlugin, css: &str) -> (String, Vec<css_core::Warning>) {
        let options = ProcessOptions::defaults_for("/p/a.css", false);
        let mut ctx = PluginContext::new(&options);
        ctx.enter(plugin.name());
        let mut root = parse(css, None).unwrap();
        plugin.run(&mut root, &mut ctx).await.unwrap();
        (stringify(&root, false).css, ctx.into_warnings())
    }

    #[tokio::test]
    async fn doubler_duplicates_each_declaration() {
        let (css, _) = apply(&Doubler, "a { color: black }").await;
        assert_eq!(css, "a { color: black; color: black }");
    }

    #[tokio::test]
    async fn async_doubler_matches_sync_output() {
        let (css, _) = apply(&AsyncDoubler::new(Duration::from_millis(1)), "a { color: black }").await;
        assert_eq!(css, "a { color: black; color: black }");
    }

    #[tokio::test]
    async fn strip_comments_keeps_important_when_asked() {
        let css = "/*! keep */a { /* drop */color: red }";
        let (plain, _) = apply(&StripComments::default(), css).await;
        assert_eq!(plain, "a {color: red }");
        let (kept, _) = apply(&StripComments { preserve_important: true }, css).await;
        assert_eq!(kept, "/*! keep */a {color: red }");
    }

    #[tokio::test]
    async fn empty_rules_produce_positioned_warnings() {
        let (_, warnings) = apply(&WarnEmptyRules, "a {}\nb { c: d }\ne { }").await;
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].to_string(), "warn-empty-rules: Empty rule \"a\"");
        assert_eq!((warnings[1].line, warnings[1].column), (Some(3), Some(1)));
    }

    #[tokio::test]
    async fn plugin_set_runs_members_in_order() {
        let set = PluginSet::new("twice", vec![Arc::new(Doubler), Arc::new(WarnEmptyRules)]);
        let (css, warnings) = apply(&set, "a { color: black }\nb {}").await;
        assert_eq!(css, "a { color: black; color: black }\nb {}");
        assert_eq!(warnings[0].to_string(), "warn-empty-rules: Empty rule \"b\"");
    }
}
