//! Serialización del árbol, con registro opcional de segmentos de mapa.

use css_core::model::source_map::{OriginalPosition, Segment};

use super::ast::{Node, Position, Root};

#[derive(Debug, Default)]
pub struct Stringified {
    pub css: String,
    /// Segmentos por línea generada; vacío si no se pidió mapa.
    pub mappings: Vec<Vec<Segment>>,
}

struct Builder {
    css: String,
    line: usize,
    column: u32,
    lines: Vec<Vec<Segment>>,
    track: bool,
}

impl Builder {
    fn push(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += c.len_utf16() as u32;
            }
        }
        self.css.push_str(text);
    }

    fn mark(&mut self, source: Option<Position>) {
        let (true, Some(at)) = (self.track, source) else {
            return;
        };
        while self.lines.len() <= self.line {
            self.lines.push(Vec::new());
        }
        self.lines[self.line].push(Segment { generated_column: self.column,
                                             original: Some(OriginalPosition { source: 0,
                                                                               line: at.line.saturating_sub(1),
                                                                               column: at.column.saturating_sub(1),
                                                                               name: None }) });
    }

    fn nodes(&mut self, nodes: &[Node], semicolon: bool) {
        let last = nodes.len().saturating_sub(1);
        for (i, node) in nodes.iter().enumerate() {
            self.node(node, i != last || semicolon);
        }
    }

    fn node(&mut self, node: &Node, semicolon: bool) {
        match node {
            Node::Comment(comment) => {
                self.push(&comment.before);
                self.push("/*");
                self.push(&comment.text);
                self.push("*/");
            }
            Node::AtRule(at_rule) => {
                self.push(&at_rule.raws.before);
                self.mark(at_rule.source);
                self.push("@");
                self.push(&at_rule.name);
                self.push(&at_rule.raws.after_name);
                self.push(&at_rule.params);
                if semicolon {
                    self.push(&at_rule.raws.between);
                    self.push(";");
                }
            }
            Node::Decl(decl) => {
                self.push(&decl.raws.before);
                self.mark(decl.source);
                self.push(&decl.prop);
                self.push(&decl.raws.between);
                self.push(&decl.value);
                if semicolon {
                    self.push(&decl.raws.after_value);
                    self.push(";");
                }
            }
            Node::Rule(rule) => {
                self.push(&rule.raws.before);
                self.mark(rule.source);
                self.push(&rule.selector);
                self.push(&rule.raws.between);
                self.push("{");
                self.nodes(&rule.nodes, rule.raws.semicolon);
                self.push(&rule.raws.after);
                self.push("}");
            }
        }
    }
}

pub fn stringify(root: &Root, track: bool) -> Stringified {
    let mut builder = Builder { css: String::new(), line: 0, column: 0, lines: Vec::new(), track };
    builder.nodes(&root.nodes, root.semicolon);
    builder.push(&root.after);
    if track {
        while builder.lines.len() <= builder.line {
            builder.lines.push(Vec::new());
        }
        while builder.lines.len() > 1 && builder.lines.last().is_some_and(Vec::is_empty) {
            builder.lines.pop();
        }
    }
    Stringified { css: builder.css, mappings: builder.lines }
}
