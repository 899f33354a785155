//! Parser de reglas, at-rules sin bloque, declaraciones y comentarios.
//!
//! Todo espacio del texto original queda en algún `raw`, así que la salida de
//! `stringify` sin plugins es idéntica byte a byte a la entrada.

use css_core::CssSyntaxError;

use super::ast::{AtRule, AtRuleRaws, Comment, DeclRaws, Declaration, Node, Position, Root, Rule, RuleRaws};

pub fn parse(css: &str, file: Option<&str>) -> Result<Root, CssSyntaxError> {
    let mut parser = Parser::new(css, file);
    let block = parser.parse_nodes(false)?;
    Ok(Root { nodes: block.nodes, after: block.after, semicolon: block.semicolon })
}

struct Block {
    nodes: Vec<Node>,
    after: String,
    semicolon: bool,
    closed: bool,
}

struct Parser<'a> {
    input: &'a str,
    file: Option<&'a str>,
    chars: Vec<char>,
    line_starts: Vec<usize>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, file: Option<&'a str>) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let mut line_starts = vec![0];
        for (i, c) in chars.iter().enumerate() {
            if *c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { input, file, chars, line_starts, pos: 0 }
    }

    fn position(&self, index: usize) -> Position {
        let line = self.line_starts.partition_point(|&start| start <= index).max(1);
        let column = index - self.line_starts[line - 1] + 1;
        Position { line: line as u32, column: column as u32 }
    }

    fn error(&self, reason: &str, index: usize) -> CssSyntaxError {
        let at = self.position(index);
        CssSyntaxError::new(reason, at.line, at.column).with_file(self.file.map(str::to_string))
                                                       .with_input(self.input)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn starts_with(&self, index: usize, pattern: &str) -> bool {
        pattern.chars().enumerate().all(|(i, c)| self.chars.get(index + i) == Some(&c))
    }

    fn find(&self, from: usize, pattern: &str) -> Option<usize> {
        (from..self.chars.len()).find(|&i| self.starts_with(i, pattern))
    }

    fn slice(&self, from: usize, to: usize) -> String {
        self.chars[from..to].iter().collect()
    }

    fn take_whitespace(&mut self) -> String {
        let start = self.pos;
        while !self.at_end() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
        self.slice(start, self.pos)
    }

    /// Espacio y `;` sueltos antes del siguiente nodo.
    fn take_before(&mut self) -> String {
        let mut before = self.take_whitespace();
        while !self.at_end() && self.chars[self.pos] == ';' {
            before.push(';');
            self.pos += 1;
            before.push_str(&self.take_whitespace());
        }
        before
    }

    /// Devuelve el índice del terminador (`{`, `;`, `}`) a nivel superior, o
    /// el final del texto. Ignora el contenido de comillas, paréntesis y
    /// comentarios.
    fn scan_statement(&self, from: usize) -> Result<(usize, Option<char>), CssSyntaxError> {
        let mut quote: Option<char> = None;
        let mut depth = 0usize;
        let mut i = from;
        while i < self.chars.len() {
            let c = self.chars[i];
            if let Some(q) = quote {
                if c == '\\' {
                    i += 1;
                } else if c == q {
                    quote = None;
                }
                i += 1;
                continue;
            }
            match c {
                '"' | '\'' => quote = Some(c),
                '/' if self.starts_with(i, "/*") => {
                    let end = self.find(i + 2, "*/").ok_or_else(|| self.error("Unclosed comment", i))?;
                    i = end + 2;
                    continue;
                }
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                '{' | ';' | '}' if depth == 0 => return Ok((i, Some(c))),
                _ => {}
            }
            i += 1;
        }
        if let Some(q) = quote {
            return Err(self.error(&format!("Unclosed string {q}"), from));
        }
        Ok((self.chars.len(), None))
    }

    fn parse_nodes(&mut self, nested: bool) -> Result<Block, CssSyntaxError> {
        let mut nodes = Vec::new();
        let mut semicolon = false;

        loop {
            let before = self.take_before();
            if self.at_end() {
                return Ok(Block { nodes, after: before, semicolon, closed: false });
            }

            let start = self.pos;
            if self.starts_with(start, "/*") {
                let end = self.find(start + 2, "*/").ok_or_else(|| self.error("Unclosed comment", start))?;
                nodes.push(Node::Comment(Comment { text: self.slice(start + 2, end),
                                                   before,
                                                   source: Some(self.position(start)) }));
                self.pos = end + 2;
                continue;
            }

            if self.chars[start] == '}' {
                if !nested {
                    return Err(self.error("Unexpected }", start));
                }
                self.pos += 1;
                return Ok(Block { nodes, after: before, semicolon, closed: true });
            }

            let (end, terminator) = self.scan_statement(start)?;
            if terminator == Some('{') {
                let raw = self.slice(start, end);
                let selector = raw.trim_end().to_string();
                let between = raw[selector.len()..].to_string();
                self.pos = end + 1;
                let block = self.parse_nodes(true)?;
                if !block.closed {
                    return Err(self.error("Unclosed block", start));
                }
                nodes.push(Node::Rule(Rule { selector,
                                             nodes: block.nodes,
                                             raws: RuleRaws { before,
                                                              between,
                                                              after: block.after,
                                                              semicolon: block.semicolon },
                                             source: Some(self.position(start)) }));
                semicolon = false;
                continue;
            }

            if self.chars[start] == '@' {
                let at_rule = self.at_rule(start, end, terminator, before)?;
                nodes.push(Node::AtRule(at_rule));
                semicolon = terminator == Some(';');
                continue;
            }

            if !nested {
                return Err(self.error("Unknown word", start));
            }
            let decl = self.declaration(start, end, terminator, before)?;
            nodes.push(Node::Decl(decl));
            semicolon = terminator == Some(';');
        }
    }

    fn at_rule(&mut self, start: usize, end: usize, terminator: Option<char>, before: String) -> Result<AtRule, CssSyntaxError> {
        let raw = self.slice(start, end);
        let body = &raw[1..];
        let name_len = body.find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
                           .unwrap_or(body.len());
        if name_len == 0 {
            return Err(self.error("At-rule without name", start));
        }
        let name = &body[..name_len];
        let rest = &body[name_len..];
        let params_region = rest.trim_start();
        let after_name = &rest[..rest.len() - params_region.len()];
        let params = params_region.trim_end();

        let between = if terminator == Some(';') {
            self.pos = end + 1;
            params_region[params.len()..].to_string()
        } else {
            // Sin `;`, el espacio final pertenece al bloque que lo contiene.
            let consumed = 1 + name_len + after_name.len() + params.len();
            self.pos = start + raw[..consumed].chars().count();
            String::new()
        };

        Ok(AtRule { name: name.to_string(),
                    params: params.to_string(),
                    raws: AtRuleRaws { before, after_name: after_name.to_string(), between },
                    source: Some(self.position(start)) })
    }

    fn declaration(&mut self, start: usize, end: usize, terminator: Option<char>, before: String) -> Result<Declaration, CssSyntaxError> {
        let raw = self.slice(start, end);
        let colon = raw.find(':').ok_or_else(|| self.error("Unknown word", start))?;
        let prop = raw[..colon].trim_end();
        if prop.is_empty() {
            return Err(self.error("Unknown word", start));
        }
        let rest = &raw[colon + 1..];
        let value_offset = colon + 1 + (rest.len() - rest.trim_start().len());
        let between = raw[prop.len()..value_offset].to_string();
        let value_region = &raw[value_offset..];
        let value = value_region.trim_end();

        let after_value = if terminator == Some(';') {
            self.pos = end + 1;
            value_region[value.len()..].to_string()
        } else {
            // El espacio final pertenece al `after` de la regla.
            self.pos = start + raw[..value_offset + value.len()].chars().count();
            String::new()
        };

        Ok(Declaration { prop: prop.to_string(),
                         value: value.to_string(),
                         raws: DeclRaws { before, between, after_value },
                         source: Some(self.position(start)) })
    }
}
