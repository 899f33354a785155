//! Fusión del mapa emitido por el motor con el mapa previo del archivo.
//!
//! El motor genera `sources` relativos al directorio del propio archivo; aquí
//! los re-basamos para que sean relativos a la raíz del stream (`base`) y
//! entregamos un único incremento al colaborador de acumulación, que es quien
//! compone la cadena de mapas sobre `file.source_map`.

use std::path::Path;

use log::debug;

use crate::errors::SourceMapError;
use crate::model::{FileRecord, SourceMap};
use crate::paths;

/// Colaborador externo que encadena un mapa incremental con el acumulado.
pub trait SourceMapApplier: Send + Sync {
    fn apply(&self, file: &mut FileRecord, map: SourceMap) -> Result<(), SourceMapError>;
}

/// Aplicador mínimo: el incremento reemplaza al mapa acumulado.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceApplier;

impl SourceMapApplier for ReplaceApplier {
    fn apply(&self, file: &mut FileRecord, map: SourceMap) -> Result<(), SourceMapError> {
        file.source_map = Some(map);
        Ok(())
    }
}

/// Fija `file` a la ruta relativa y une cada `source` al directorio de esa ruta.
pub fn rebase_map(mut map: SourceMap, relative: &Path) -> SourceMap {
    let dir = paths::dirname(relative);
    map.file = paths::to_slash(relative);
    map.sources = map.sources
                     .iter()
                     .map(|source| paths::to_slash(&paths::join(&dir, source)))
                     .collect();
    map
}

/// Sólo se invoca cuando el archivo ya traía mapa (se pidió generación).
pub fn merge_map(file: &mut FileRecord, engine_map: Option<SourceMap>, applier: &dyn SourceMapApplier) -> Result<(), SourceMapError> {
    let map = engine_map.ok_or(SourceMapError::NotGenerated)?;
    let relative = file.relative();
    let rebased = rebase_map(map, &relative);
    debug!("sourcemap:apply file={} sources={:?}", rebased.file, rebased.sources);
    applier.apply(file, rebased)
}
