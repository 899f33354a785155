//! Source map v3: forma serializable y codec VLQ de `mappings`.
//!
//! El core no compone cadenas de mapas (eso lo hace el colaborador de
//! acumulación); aquí sólo vive el modelo y la (de)codificación de segmentos
//! que comparten el motor y los adaptadores.

use serde::{Deserialize, Serialize};

use crate::errors::SourceMapError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    #[serde(default)]
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub mappings: String,
}

impl SourceMap {
    pub fn new(file: impl Into<String>) -> Self {
        Self { version: 3,
               file: file.into(),
               source_root: None,
               sources: Vec::new(),
               sources_content: None,
               names: Vec::new(),
               mappings: String::new() }
    }

    /// Mapa inicial que adjunta una etapa previa: sin mappings, con el propio
    /// archivo como única fuente y su contenido embebido.
    pub fn identity_for(relative: impl Into<String>, content: Option<String>) -> Self {
        let relative = relative.into();
        let mut map = Self::new(relative.clone());
        map.sources = vec![relative];
        map.sources_content = Some(vec![content]);
        map
    }

    pub fn from_json(raw: &str) -> Result<Self, SourceMapError> {
        serde_json::from_str(raw).map_err(|e| SourceMapError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, SourceMapError> {
        serde_json::to_string(self).map_err(|e| SourceMapError::Malformed(e.to_string()))
    }

    pub fn decoded_mappings(&self) -> Result<Vec<Vec<Segment>>, SourceMapError> {
        decode_mappings(&self.mappings)
    }
}

/// Posición original a la que apunta un segmento (todas las coordenadas en base 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalPosition {
    pub source: usize,
    pub line: u32,
    pub column: u32,
    pub name: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub generated_column: u32,
    pub original: Option<OriginalPosition>,
}

const BASE64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

pub fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 { ((-value) << 1) | 1 } else { value << 1 };
    loop {
        let mut digit = (vlq & 0x1F) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0x20; // continuation bit
        }
        out.push(BASE64_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

fn base64_value(c: u8) -> Option<i64> {
    BASE64_CHARS.iter().position(|&b| b == c).map(|p| p as i64)
}

fn decode_vlq(bytes: &[u8], pos: &mut usize) -> Result<i64, SourceMapError> {
    let mut result: i64 = 0;
    let mut shift = 0;
    loop {
        let c = *bytes.get(*pos).ok_or(SourceMapError::InvalidMappings(*pos))?;
        let digit = base64_value(c).ok_or(SourceMapError::InvalidMappings(*pos))?;
        *pos += 1;
        result += (digit & 0x1F) << shift;
        if digit & 0x20 == 0 {
            break;
        }
        shift += 5;
        if shift > 60 {
            return Err(SourceMapError::InvalidMappings(*pos));
        }
    }
    let negative = result & 1 == 1;
    let value = result >> 1;
    Ok(if negative { -value } else { value })
}

/// Decodifica `mappings` en líneas de segmentos con coordenadas absolutas.
pub fn decode_mappings(mappings: &str) -> Result<Vec<Vec<Segment>>, SourceMapError> {
    let bytes = mappings.as_bytes();
    let mut lines = vec![Vec::new()];
    let (mut source, mut line, mut column, mut name) = (0i64, 0i64, 0i64, 0i64);
    let mut generated_column = 0i64;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b';' => {
                lines.push(Vec::new());
                generated_column = 0;
                pos += 1;
            }
            b',' => pos += 1,
            _ => {
                generated_column += decode_vlq(bytes, &mut pos)?;
                let mut fields = Vec::with_capacity(4);
                while pos < bytes.len() && bytes[pos] != b',' && bytes[pos] != b';' {
                    fields.push(decode_vlq(bytes, &mut pos)?);
                }
                let original = match fields.len() {
                    0 => None,
                    3 | 4 => {
                        source += fields[0];
                        line += fields[1];
                        column += fields[2];
                        let named = if fields.len() == 4 {
                            name += fields[3];
                            Some(name as usize)
                        } else {
                            None
                        };
                        Some(OriginalPosition { source: source as usize,
                                                line: line as u32,
                                                column: column as u32,
                                                name: named })
                    }
                    _ => return Err(SourceMapError::InvalidMappings(pos)),
                };
                if let Some(current) = lines.last_mut() {
                    current.push(Segment { generated_column: generated_column as u32, original });
                }
            }
        }
    }
    Ok(lines)
}

/// Inverso de `decode_mappings`; los segmentos de cada línea deben venir
/// ordenados por columna generada.
pub fn encode_mappings(lines: &[Vec<Segment>]) -> String {
    let mut out = String::new();
    let (mut source, mut line, mut column, mut name) = (0i64, 0i64, 0i64, 0i64);

    for (index, segments) in lines.iter().enumerate() {
        if index > 0 {
            out.push(';');
        }
        let mut generated_column = 0i64;
        for (i, seg) in segments.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            encode_vlq(seg.generated_column as i64 - generated_column, &mut out);
            generated_column = seg.generated_column as i64;
            if let Some(orig) = seg.original {
                encode_vlq(orig.source as i64 - source, &mut out);
                encode_vlq(orig.line as i64 - line, &mut out);
                encode_vlq(orig.column as i64 - column, &mut out);
                source = orig.source as i64;
                line = orig.line as i64;
                column = orig.column as i64;
                if let Some(n) = orig.name {
                    encode_vlq(n as i64 - name, &mut out);
                    name = n as i64;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: i64) -> String {
        let mut s = String::new();
        encode_vlq(value, &mut s);
        s
    }

    #[test]
    fn vlq_known_values() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(4), "I");
        assert_eq!(vlq(14), "c");
        assert_eq!(vlq(16), "gB");
    }

    #[test]
    fn decode_resolves_relative_fields() {
        let lines = decode_mappings("AAAA,IAAI;EACA").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][1].generated_column, 4);
        assert_eq!(lines[0][1].original.unwrap().column, 4);
        assert_eq!(lines[1][0].generated_column, 2);
        let orig = lines[1][0].original.unwrap();
        assert_eq!((orig.line, orig.column), (1, 4));
    }

    #[test]
    fn encode_is_inverse_of_decode() {
        let raw = "AAAA,IAAI,cAAA;AACA,gBAAgB";
        assert_eq!(encode_mappings(&decode_mappings(raw).unwrap()), raw);
    }

    #[test]
    fn invalid_character_is_rejected() {
        assert!(matches!(decode_mappings("AA!A"), Err(SourceMapError::InvalidMappings(_))));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let map = SourceMap::identity_for("fixture.css", Some("a {}".into()));
        let json = map.to_json().unwrap();
        assert!(json.contains("\"sourcesContent\":[\"a {}\"]"));
        assert!(!json.contains("sourceRoot"));
        assert_eq!(SourceMap::from_json(&json).unwrap(), map);
    }
}
