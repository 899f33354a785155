//! Acumulación de source maps sobre el registro.
//!
//! Cada transformación aporta un mapa incremental (salida → entrada de esa
//! etapa). Si el registro ya acumulaba mappings, el incremento se compone
//! sobre ellos para que el mapa resultante apunte a las fuentes originales.

use css_core::model::source_map::{encode_mappings, OriginalPosition, Segment};
use css_core::{FileRecord, SourceMap, SourceMapApplier, SourceMapError};
use indexmap::IndexMap;
use log::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct ComposingApplier;

fn unix_style(path: &str) -> String {
    path.replace('\\', "/")
}

fn validate(mut map: SourceMap) -> Result<SourceMap, SourceMapError> {
    if map.file.is_empty() {
        return Err(SourceMapError::MissingProperty("file"));
    }
    if map.sources.is_empty() && !map.mappings.is_empty() {
        return Err(SourceMapError::MissingProperty("sources"));
    }
    map.file = unix_style(&map.file);
    map.sources = map.sources.iter().map(|s| unix_style(s)).collect();
    Ok(map)
}

fn content_of(map: &SourceMap, index: usize) -> Option<String> {
    map.sources_content.as_ref().and_then(|c| c.get(index).cloned().flatten())
}

/// Fuentes y nombres del mapa compuesto, en orden de primera aparición.
#[derive(Default)]
struct Interner {
    sources: IndexMap<String, Option<String>>,
    names: IndexMap<String, ()>,
}

impl Interner {
    fn source(&mut self, name: &str, content: Option<String>) -> usize {
        let entry = self.sources.entry(name.to_string());
        let index = entry.index();
        let slot = entry.or_insert(None);
        if slot.is_none() {
            *slot = content;
        }
        index
    }

    fn name(&mut self, name: &str) -> usize {
        self.names.insert_full(name.to_string(), ()).0
    }
}

/// Busca en `lines` el segmento con mayor columna generada `<= column`.
fn lookup(lines: &[Vec<Segment>], line: u32, column: u32) -> Option<OriginalPosition> {
    lines.get(line as usize)?
         .iter()
         .take_while(|s| s.generated_column <= column)
         .last()
         .and_then(|s| s.original)
}

/// Compone `incoming` (salida → `existing.file`) sobre `existing`.
pub fn compose(incoming: &SourceMap, existing: &SourceMap) -> Result<SourceMap, SourceMapError> {
    let incoming_lines = incoming.decoded_mappings()?;
    let existing_lines = existing.decoded_mappings()?;
    let target = incoming.sources.iter().position(|s| *s == existing.file);

    let mut interner = Interner::default();
    let mut lines = Vec::with_capacity(incoming_lines.len());
    for segments in &incoming_lines {
        let mut out = Vec::with_capacity(segments.len());
        for seg in segments {
            let Some(orig) = seg.original else {
                out.push(*seg);
                continue;
            };
            let traced = (Some(orig.source) == target).then(|| lookup(&existing_lines, orig.line, orig.column))
                                                      .flatten();
            let original = match traced {
                Some(prev) => {
                    let source_name = existing.sources.get(prev.source).ok_or(SourceMapError::InvalidMappings(0))?;
                    let name = match (prev.name.and_then(|n| existing.names.get(n)), orig.name.and_then(|n| incoming.names.get(n))) {
                        (Some(n), _) | (None, Some(n)) => Some(interner.name(n)),
                        (None, None) => None,
                    };
                    OriginalPosition { source: interner.source(source_name, content_of(existing, prev.source)),
                                       line: prev.line,
                                       column: prev.column,
                                       name }
                }
                None => {
                    let source_name = incoming.sources.get(orig.source).ok_or(SourceMapError::InvalidMappings(0))?;
                    OriginalPosition { source: interner.source(source_name, content_of(incoming, orig.source)),
                                       line: orig.line,
                                       column: orig.column,
                                       name: orig.name.and_then(|n| incoming.names.get(n)).map(|n| interner.name(n)) }
                }
            };
            out.push(Segment { generated_column: seg.generated_column, original: Some(original) });
        }
        lines.push(out);
    }

    let mut composed = SourceMap::new(incoming.file.clone());
    let contents: Vec<Option<String>> = interner.sources.values().cloned().collect();
    composed.sources = interner.sources.into_keys().collect();
    if contents.iter().any(Option::is_some) {
        composed.sources_content = Some(contents);
    }
    composed.names = interner.names.into_keys().collect();
    composed.mappings = encode_mappings(&lines);
    Ok(composed)
}

impl SourceMapApplier for ComposingApplier {
    fn apply(&self, file: &mut FileRecord, map: SourceMap) -> Result<(), SourceMapError> {
        let mut incoming = validate(map)?;
        let merged = match file.source_map.take() {
            Some(existing) if !existing.mappings.is_empty() => {
                debug!("applier:compose {} over {}", incoming.file, existing.file);
                compose(&incoming, &existing)?
            }
            Some(existing) => {
                if incoming.sources_content.is_none() {
                    let carried: Vec<Option<String>> = incoming.sources
                                                               .iter()
                                                               .map(|s| {
                                                                   existing.sources
                                                                           .iter()
                                                                           .position(|e| e == s)
                                                                           .and_then(|i| content_of(&existing, i))
                                                               })
                                                               .collect();
                    if carried.iter().any(Option::is_some) {
                        incoming.sources_content = Some(carried);
                    }
                }
                incoming
            }
            None => incoming,
        };
        file.source_map = Some(merged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(file: &str, sources: &[&str], mappings: &str) -> SourceMap {
        let mut m = SourceMap::new(file);
        m.sources = sources.iter().map(|s| s.to_string()).collect();
        m.mappings = mappings.to_string();
        m
    }

    #[test]
    fn empty_existing_map_is_replaced_and_content_carried() {
        let mut file = FileRecord::from_text("/p", "/p/a.css", "a{}")
            .with_source_map(SourceMap::identity_for("a.css", Some("a{}".into())));
        ComposingApplier.apply(&mut file, map("a.css", &["a.css"], "AAAA")).unwrap();
        let result = file.source_map.unwrap();
        assert_eq!(result.mappings, "AAAA");
        assert_eq!(result.sources_content, Some(vec![Some("a{}".to_string())]));
    }

    #[test]
    fn backslashes_are_normalised() {
        let mut file = FileRecord::from_text("/p", "/p/a.css", "a{}").with_source_map(SourceMap::identity_for("sub/a.css", None));
        ComposingApplier.apply(&mut file, map("sub\\a.css", &["sub\\a.css"], "AAAA")).unwrap();
        let result = file.source_map.unwrap();
        assert_eq!(result.file, "sub/a.css");
        assert_eq!(result.sources, vec!["sub/a.css"]);
    }

    #[test]
    fn missing_file_is_rejected() {
        let mut file = FileRecord::from_text("/p", "/p/a.css", "a{}");
        assert_eq!(ComposingApplier.apply(&mut file, map("", &["a.css"], "AAAA")),
                   Err(SourceMapError::MissingProperty("file")));
    }

    #[test]
    fn composition_traces_back_to_original_sources() {
        // Etapa 1: "a.css" (original.scss) con la declaración en columna 4 que
        // venía de la línea 2, columna 2 del original.
        let existing = map("a.css", &["original.scss"], "AAAA,IACE");
        // Etapa 2: la salida duplica la declaración (columnas 4 y 18).
        let incoming = map("a.css", &["a.css"], "AAAA,IAAI,cAAA");
        let composed = compose(&incoming, &existing).unwrap();
        assert_eq!(composed.sources, vec!["original.scss"]);
        let lines = composed.decoded_mappings().unwrap();
        let targets: Vec<_> = lines[0].iter().map(|s| s.original.map(|o| (o.line, o.column))).collect();
        assert_eq!(targets, vec![Some((0, 0)), Some((1, 2)), Some((1, 2))]);
    }

    #[test]
    fn segments_from_other_sources_are_kept() {
        let existing = map("a.css", &["original.scss"], "AAAA");
        let incoming = map("a.css", &["a.css", "vendor.css"], "AAAA,ICAA");
        let composed = compose(&incoming, &existing).unwrap();
        assert_eq!(composed.sources, vec!["original.scss", "vendor.css"]);
    }
}
