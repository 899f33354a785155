//! Árbol CSS mínimo con los espacios originales (`raws`) conservados, de modo
//! que `stringify(parse(x)) == x`.

/// Posición en el texto original. Línea y columna en base 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Root {
    pub nodes: Vec<Node>,
    /// Espacio tras el último nodo.
    pub after: String,
    /// El último nodo terminaba en `;`.
    pub semicolon: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Decl(Declaration),
    Comment(Comment),
}

impl Node {
    pub fn source(&self) -> Option<Position> {
        match self {
            Node::Rule(r) => r.source,
            Node::AtRule(a) => a.source,
            Node::Decl(d) => d.source,
            Node::Comment(c) => c.source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleRaws {
    pub before: String,
    /// Entre el selector y `{`.
    pub between: String,
    /// Entre el último hijo y `}`.
    pub after: String,
    /// El último hijo terminaba en `;`.
    pub semicolon: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<Node>,
    pub raws: RuleRaws,
    pub source: Option<Position>,
}

impl Rule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self { selector: selector.into(),
               nodes: Vec::new(),
               raws: RuleRaws { before: String::new(), between: " ".into(), after: " ".into(), semicolon: false },
               source: None }
    }

    pub fn decls(&self) -> impl Iterator<Item = &Declaration> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Decl(d) => Some(d),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AtRuleRaws {
    pub before: String,
    /// Entre el nombre y los parámetros.
    pub after_name: String,
    /// Entre los parámetros y `;`.
    pub between: String,
}

/// Sentencia `@nombre params;` sin bloque (`@import`, `@charset`, `@layer a, b`).
/// Las at-rules con bloque se representan como `Rule`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    pub raws: AtRuleRaws,
    pub source: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeclRaws {
    pub before: String,
    /// `:` con los espacios que lo rodean.
    pub between: String,
    /// Espacio entre el valor y `;`.
    pub after_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub prop: String,
    pub value: String,
    pub raws: DeclRaws,
    pub source: Option<Position>,
}

impl Declaration {
    pub fn new(prop: impl Into<String>, value: impl Into<String>) -> Self {
        Self { prop: prop.into(),
               value: value.into(),
               raws: DeclRaws { before: " ".into(), between: ": ".into(), after_value: String::new() },
               source: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Contenido entre `/*` y `*/`, sin tocar.
    pub text: String,
    pub before: String,
    pub source: Option<Position>,
}

impl Comment {
    /// Comentarios `/*! ... */` que los minificadores conservan.
    pub fn is_important(&self) -> bool {
        self.text.starts_with('!')
    }
}

/// Recorre reglas en profundidad, padres antes que hijos.
pub fn walk_rules_mut(nodes: &mut [Node], f: &mut dyn FnMut(&mut Rule)) {
    for node in nodes.iter_mut() {
        if let Node::Rule(rule) = node {
            f(rule);
            walk_rules_mut(&mut rule.nodes, f);
        }
    }
}

pub fn walk_rules<'a>(nodes: &'a [Node], f: &mut dyn FnMut(&'a Rule)) {
    for node in nodes {
        if let Node::Rule(rule) = node {
            f(rule);
            walk_rules(&rule.nodes, f);
        }
    }
}
