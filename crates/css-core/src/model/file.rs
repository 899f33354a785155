//! Registro de archivo que fluye por el stream.
//!
//! El registro pertenece al colaborador de stream: el core sólo lee `path` y
//! `base`, reemplaza `contents` y, si ya existía, el `source_map`.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::io::AsyncRead;

use crate::model::source_map::SourceMap;
use crate::paths;

/// Contenido de un registro.
pub enum Contents {
    /// Registro marcador (sin contenido); se deja pasar intacto.
    Null,
    /// Respaldado por un stream abierto; no soportado por el transform.
    Stream(Box<dyn AsyncRead + Send + Sync + Unpin>),
    /// Contenido materializado en memoria.
    Buffer(Vec<u8>),
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contents::Null => f.write_str("Null"),
            Contents::Stream(_) => f.write_str("Stream(..)"),
            Contents::Buffer(b) => write!(f, "Buffer({} bytes)", b.len()),
        }
    }
}

#[derive(Debug)]
pub struct FileRecord {
    path: PathBuf,
    base: PathBuf,
    pub contents: Contents,
    /// Presente sólo si una etapa previa del pipeline adjuntó un mapa.
    pub source_map: Option<SourceMap>,
}

impl FileRecord {
    /// `path` y `base` se guardan absolutos, resueltos contra el directorio
    /// de trabajo si llegan relativos.
    pub fn new(base: impl AsRef<Path>, path: impl AsRef<Path>, contents: Contents) -> Self {
        Self { path: paths::absolute(path.as_ref()),
               base: paths::absolute(base.as_ref()),
               contents,
               source_map: None }
    }

    /// Atajo para registros con contenido de texto.
    pub fn from_text(base: impl AsRef<Path>, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        Self::new(base, path, Contents::Buffer(text.into().into_bytes()))
    }

    pub fn with_source_map(mut self, map: SourceMap) -> Self {
        self.source_map = Some(map);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Ruta relativa a `base` (derivada, nunca almacenada).
    pub fn relative(&self) -> PathBuf {
        paths::relative(&self.base, &self.path)
    }

    pub fn dirname(&self) -> PathBuf {
        paths::dirname(&self.path)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.contents, Contents::Null)
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.contents, Contents::Stream(_))
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self.contents, Contents::Buffer(_))
    }

    /// Texto del contenido en memoria (decodificación UTF-8 con pérdida).
    pub fn text(&self) -> Option<String> {
        match &self.contents {
            Contents::Buffer(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    pub fn set_text(&mut self, text: String) {
        self.contents = Contents::Buffer(text.into_bytes());
    }
}
