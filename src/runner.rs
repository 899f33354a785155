//! Runner de línea de comandos: lee archivos del disco, los pasa por el
//! transform y escribe el resultado bajo el directorio de salida.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use css_adapters::{ComposingApplier, FsConfigDiscovery, PluginRegistry, RegistryError, RuleEngine, SharedPlugin};
use css_core::{paths, ConfigSource, CssTransform, FileRecord, LogReporter, Reporter, SilentReporter, SourceMap,
               TransformStream};
use log::{error, info};
use serde_json::{Map, Value};

use crate::config::RunnerConfig;
use crate::errors::CoreError;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.written.len() + self.failed
    }
}

/// Lista explícita cuando se nombraron plugins; si no, descubrimiento en disco.
pub fn config_source(config: &RunnerConfig, registry: Arc<PluginRegistry>) -> Result<ConfigSource<SharedPlugin>, CoreError> {
    if !config.plugins.is_empty() {
        let plugins = config.plugins
                            .iter()
                            .map(|name| registry.create(name, &Value::Null))
                            .collect::<Result<Vec<_>, _>>()
                            .map_err(|e| registry_error(&registry, e))?;
        return Ok(ConfigSource::plugins(plugins));
    }
    let mut options = Map::new();
    if let Some(path) = &config.config_path {
        options.insert("config".into(), Value::String(path.clone()));
    }
    Ok(ConfigSource::discover(options, Arc::new(FsConfigDiscovery::new(registry))))
}

fn registry_error(registry: &PluginRegistry, err: RegistryError) -> CoreError {
    match err {
        RegistryError::Unknown(_) => {
            let known = registry.names().collect::<Vec<_>>().join(", ");
            CoreError::Config(format!("{err} (available: {known})"))
        }
        other => CoreError::Config(other.to_string()),
    }
}

/// Destino de un registro: su ruta relativa bajo `out_dir`. Las rutas que
/// salen de la base, o que no tienen forma relativa, se aplanan a su nombre de
/// archivo para no escribir nunca fuera de `out_dir`.
pub fn output_path(out_dir: &Path, file: &FileRecord) -> PathBuf {
    let relative = file.relative();
    let escapes = relative.components()
                          .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    match (escapes, relative.file_name()) {
        (true, Some(name)) => out_dir.join(name),
        _ => out_dir.join(relative),
    }
}

async fn read_record(config: &RunnerConfig, path: &Path) -> Result<FileRecord, CoreError> {
    let text = tokio::fs::read_to_string(path).await?;
    let record = FileRecord::from_text(&config.base_dir, path, text);
    if !config.sourcemaps {
        return Ok(record);
    }
    let relative = paths::to_slash(&record.relative());
    let content = record.text();
    Ok(record.with_source_map(SourceMap::identity_for(relative, content)))
}

async fn write_record(out_dir: &Path, file: &FileRecord) -> Result<PathBuf, CoreError> {
    let dest = output_path(out_dir, file);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut css = file.text().unwrap_or_default();
    if let Some(map) = &file.source_map {
        let name = dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let map_path = dest.with_file_name(format!("{name}.map"));
        tokio::fs::write(&map_path, map.to_json()?).await?;
        css.push_str(&format!("\n/*# sourceMappingURL={name}.map */\n"));
    }
    tokio::fs::write(&dest, css).await?;
    Ok(dest)
}

pub async fn run(config: &RunnerConfig, files: &[PathBuf]) -> Result<RunSummary, CoreError> {
    let registry = Arc::new(PluginRegistry::with_builtins());
    let source = config_source(config, registry)?;
    let reporter: Arc<dyn Reporter> = if config.quiet { Arc::new(SilentReporter) } else { Arc::new(LogReporter) };
    let transform = CssTransform::new(Arc::new(RuleEngine::new()), source).with_reporter(reporter)
                                                                          .with_applier(Arc::new(ComposingApplier));

    let mut records = Vec::with_capacity(files.len());
    for path in files {
        records.push(read_record(config, path).await?);
    }
    info!("runner: {} file(s), concurrency={}", records.len(), config.concurrency);

    let mut summary = RunSummary::default();
    for completion in TransformStream::from_records(transform, records, config.concurrency).collect().await {
        match completion {
            Ok(file) if file.is_null() => {}
            Ok(file) => summary.written.push(write_record(&config.out_dir, &file).await?),
            Err(err) => {
                error!("{err}");
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_keeps_relative_layout() {
        let file = FileRecord::from_text("styles", "styles/parts/nav.css", "");
        assert_eq!(output_path(Path::new("dist"), &file), PathBuf::from("dist/parts/nav.css"));
    }

    #[test]
    fn output_flattens_paths_outside_base() {
        let file = FileRecord::from_text("styles", "vendor/reset.css", "");
        assert_eq!(output_path(Path::new("dist"), &file), PathBuf::from("dist/reset.css"));
    }

    #[test]
    fn unknown_plugin_name_is_a_config_error() {
        let config = RunnerConfig { plugins: vec!["nope".into()], ..RunnerConfig::default() };
        let err = config_source(&config, Arc::new(PluginRegistry::with_builtins())).err().expect("expected a config error");
        assert_eq!(err.to_string(),
                   "Error de configuración: unknown plugin \"nope\" (available: doubler, async-doubler, strip-comments, \
                    warn-empty-rules, set)");
    }

    #[test]
    fn output_never_leaves_out_dir_for_absolute_inputs() {
        let file = FileRecord::from_text("/", "/tmp/x/a.css", "");
        assert_eq!(output_path(Path::new("/out"), &file), PathBuf::from("/out/tmp/x/a.css"));
        let outside = FileRecord::from_text("/srv/styles", "/tmp/x/a.css", "");
        assert_eq!(output_path(Path::new("/out"), &outside), PathBuf::from("/out/a.css"));
    }
}
