//! Transform por archivo.
//!
//! Orquesta, para cada registro, la cadena completa:
//! resolver configuración → fusionar opciones → invocar motor → reemplazar
//! contenido → fusionar mapa → reportar advertencias. Cualquier fallo se
//! clasifica en `PluginError`. La señal de finalización se difiere un tick
//! del runtime en todos los casos salvo el registro nulo, que pasa de
//! inmediato.

pub mod stream;

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::oneshot;

use crate::classify::classify;
use crate::config::ConfigSource;
use crate::engine::{self, Engine};
use crate::errors::{PluginError, TransformError};
use crate::model::{Contents, FileRecord, ProcessOptions};
use crate::options::{merge_options, ProtectedKeys};
use crate::paths;
use crate::report::{self, LogReporter, Reporter};
use crate::sourcemap::{merge_map, ReplaceApplier, SourceMapApplier};

pub use stream::TransformStream;

/// Resultado de un registro: el archivo transformado o el error estructurado.
pub type Completion = Result<FileRecord, PluginError>;

/// Callback de finalización de un registro. Se consume al señalizar, así que
/// cada registro recibe exactamente una señal.
#[derive(Debug)]
pub struct Done(oneshot::Sender<Completion>);

impl Done {
    pub fn channel() -> (Done, oneshot::Receiver<Completion>) {
        let (tx, rx) = oneshot::channel();
        (Done(tx), rx)
    }

    fn signal(self, outcome: Completion) {
        if self.0.send(outcome).is_err() {
            debug!("transform:done receiver dropped");
        }
    }
}

pub struct CssTransform<E: Engine> {
    engine: Arc<E>,
    config: Arc<ConfigSource<E::Plugin>>,
    reporter: Arc<dyn Reporter>,
    applier: Arc<dyn SourceMapApplier>,
}

impl<E: Engine> Clone for CssTransform<E> {
    fn clone(&self) -> Self {
        Self { engine: Arc::clone(&self.engine),
               config: Arc::clone(&self.config),
               reporter: Arc::clone(&self.reporter),
               applier: Arc::clone(&self.applier) }
    }
}

impl<E: Engine> CssTransform<E> {
    /// La forma de configuración queda fijada aquí, una vez.
    pub fn new(engine: Arc<E>, config: ConfigSource<E::Plugin>) -> Self {
        Self { engine,
               config: Arc::new(config),
               reporter: Arc::new(LogReporter),
               applier: Arc::new(ReplaceApplier) }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_applier(mut self, applier: Arc<dyn SourceMapApplier>) -> Self {
        self.applier = applier;
        self
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }
}

impl<E> CssTransform<E>
    where E: Engine,
          E::Plugin: Clone
{
    /// Aplica la cadena al registro en sitio. Registros nulos no se tocan;
    /// los respaldados por stream fallan sin resolver configuración.
    pub async fn process_file(&self, file: &mut FileRecord) -> Result<(), TransformError> {
        let text = match &file.contents {
            Contents::Null => return Ok(()),
            Contents::Stream(_) => return Err(TransformError::StreamsNotSupported),
            Contents::Buffer(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };

        let has_map = file.source_map.is_some();
        let protected = ProtectedKeys::for_file(has_map);
        let defaults = ProcessOptions::defaults_for(file.path(), has_map);

        let resolved = self.config.resolve(file).await?;
        let merged = merge_options(defaults, &resolved.options, protected);

        let relative = file.relative();
        let relative_slash = paths::to_slash(&relative);
        for rejection in &merged.rejected {
            report::report_diagnostic(self.reporter.as_ref(), &rejection.diagnostic(&relative_slash));
        }

        let output = engine::invoke(self.engine.as_ref(), &resolved.plugins, &merged.options, &text).await?;

        file.set_text(output.css);
        if has_map {
            merge_map(file, output.map, self.applier.as_ref())?;
        }
        report::report_warnings(self.reporter.as_ref(), &output.warnings, &relative);
        Ok(())
    }

    /// Procesa y clasifica, sin diferir.
    pub async fn complete(&self, mut file: FileRecord) -> Completion {
        match self.process_file(&mut file).await {
            Ok(()) => Ok(file),
            Err(err) => {
                warn!("transform:failed file={} stage={} error={}", file.path().display(), err.stage(), err);
                Err(classify(err, &file))
            }
        }
    }

    /// Punto de entrada por registro con la convención de callback del stream.
    pub async fn transform(&self, file: FileRecord, done: Done) {
        if file.is_null() {
            debug!("transform:passthrough null file={}", file.path().display());
            done.signal(Ok(file));
            return;
        }
        let outcome = self.complete(file).await;
        tokio::task::yield_now().await;
        done.signal(outcome);
    }

    /// Variante con futuro: transforma y espera la señal.
    pub async fn run(&self, file: FileRecord) -> Option<Completion> {
        let (done, rx) = Done::channel();
        self.transform(file, done).await;
        rx.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolvedConfig;
    use crate::errors::{BoxError, CssSyntaxError, EngineError};
    use crate::model::{EngineOutput, SourceMap, Warning};
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};
    use std::sync::Mutex;
    use tokio::sync::oneshot::error::TryRecvError;

    /// Motor de prueba: añade el nombre de cada plugin como comentario y
    /// registra las opciones recibidas.
    #[derive(Default)]
    struct Tagging {
        calls: Mutex<Vec<ProcessOptions>>,
    }

    #[async_trait]
    impl Engine for Tagging {
        type Plugin = &'static str;

        async fn process(&self, plugins: &[&'static str], css: &str, options: &ProcessOptions) -> Result<EngineOutput, EngineError> {
            self.calls.lock().unwrap().push(options.clone());
            if css.contains("!syntax") {
                return Err(CssSyntaxError::new("Unknown word", 1, 1).with_input(css).into());
            }
            let mut out = EngineOutput::passthrough(css);
            for plugin in plugins {
                if *plugin == "warn" {
                    out.warnings.push(Warning::new("careful"));
                } else {
                    out.css.push_str(&format!("/*{plugin}*/"));
                }
            }
            if options.map.is_enabled() {
                let mut map = SourceMap::new("out.css");
                map.sources = vec!["fixture.css".into()];
                out.map = Some(map);
            }
            Ok(out)
        }
    }

    #[derive(Default)]
    struct Capture(Mutex<Vec<String>>);

    impl Reporter for Capture {
        fn info(&self, tag: &str, message: &str) {
            self.0.lock().unwrap().push(format!("{tag} {message}"));
        }
    }

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    fn setup(config: ConfigSource<&'static str>) -> (CssTransform<Tagging>, Arc<Tagging>, Arc<Capture>) {
        let engine = Arc::new(Tagging::default());
        let capture = Arc::new(Capture::default());
        let transform = CssTransform::new(engine.clone(), config).with_reporter(capture.clone());
        (transform, engine, capture)
    }

    fn css_file(text: &str) -> FileRecord {
        FileRecord::from_text("/p/src", "/p/src/sub/fixture.css", text)
    }

    #[tokio::test]
    async fn plugins_run_in_declared_order() {
        let (t, _, _) = setup(ConfigSource::plugins(vec!["a", "b"]));
        let out = t.run(css_file("x{}")).await.unwrap().unwrap();
        assert_eq!(out.text().as_deref(), Some("x{}/*a*//*b*/"));
    }

    #[tokio::test]
    async fn null_records_skip_the_engine() {
        let (t, engine, _) = setup(ConfigSource::plugins(vec!["a"]));
        let out = t.run(FileRecord::new("/p", "/p/a.css", Contents::Null)).await.unwrap().unwrap();
        assert!(out.is_null());
        assert!(engine.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stream_records_fail_without_engine_or_config() {
        let calls = Arc::new(Mutex::new(0));
        let seen = calls.clone();
        let config = ConfigSource::from_fn(move |_: &FileRecord| {
            *seen.lock().unwrap() += 1;
            Ok::<_, BoxError>(ResolvedConfig::new(vec![], Map::new()))
        });
        let (t, engine, _) = setup(config);
        let file = FileRecord::new("/p", "/p/a.css", Contents::Stream(Box::new(tokio::io::empty())));
        let err = t.run(file).await.unwrap().unwrap_err();
        assert_eq!(err.message, "Streams are not supported!");
        assert!(engine.calls.lock().unwrap().is_empty());
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn defaults_point_from_and_to_at_the_file() {
        let (t, engine, _) = setup(ConfigSource::plugins(vec![]));
        t.run(css_file("x{}")).await.unwrap().unwrap();
        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls[0], ProcessOptions::defaults_for("/p/src/sub/fixture.css", false));
    }

    #[tokio::test]
    async fn protected_keys_are_reported_once_each() {
        let config = ConfigSource::plugins_with_options(vec![], obj(json!({"from": "overriden", "map": "overriden"})));
        let (t, engine, capture) = setup(config);
        let file = css_file("x{}").with_source_map(SourceMap::identity_for("sub/fixture.css", None));
        t.run(file).await.unwrap().unwrap();

        let sent = engine.calls.lock().unwrap()[0].clone();
        assert_eq!(sent.from, Some("/p/src/sub/fixture.css".into()));
        assert!(sent.map.is_enabled());
        let logged = capture.0.lock().unwrap();
        assert_eq!(logged.as_slice(),
                   ["cssflow: Cannot override \"from\" option because it is required by source maps (sub/fixture.css)",
                    "cssflow: Cannot override \"map\" option because it is required by source maps (sub/fixture.css)"]);
    }

    #[tokio::test]
    async fn engine_map_is_rebased_onto_relative_path() {
        let (t, _, _) = setup(ConfigSource::plugins(vec![]));
        let file = css_file("x{}").with_source_map(SourceMap::identity_for("sub/fixture.css", None));
        let out = t.run(file).await.unwrap().unwrap();
        let map = out.source_map.unwrap();
        assert_eq!(map.file, "sub/fixture.css");
        assert_eq!(map.sources, vec!["sub/fixture.css"]);
    }

    #[tokio::test]
    async fn warnings_are_reported_in_one_call() {
        let (t, _, capture) = setup(ConfigSource::plugins(vec!["warn", "warn"]));
        t.run(css_file("x{}")).await.unwrap().unwrap();
        assert_eq!(capture.0.lock().unwrap().as_slice(), ["cssflow: careful\ncareful (sub/fixture.css)"]);
    }

    #[tokio::test]
    async fn syntax_failures_are_classified() {
        let (t, _, _) = setup(ConfigSource::plugins(vec![]));
        let err = t.run(css_file("!syntax")).await.unwrap().unwrap_err();
        assert!(!err.show_stack);
        assert_eq!(err.line_number, Some(1));
        assert!(err.source_excerpt.is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn completion_is_deferred_one_tick() {
        let (t, _, _) = setup(ConfigSource::plugins(vec![]));
        let (done, mut rx) = Done::channel();
        let mut task = tokio_test::task::spawn(t.transform(css_file("x{}"), done));
        assert!(task.poll().is_pending());
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
        assert!(task.poll().is_ready());
        assert!(rx.try_recv().unwrap().is_ok());
    }

    #[test]
    fn null_completion_is_immediate() {
        let (t, _, _) = setup(ConfigSource::plugins(vec![]));
        let (done, mut rx) = Done::channel();
        let mut task = tokio_test::task::spawn(t.transform(FileRecord::new("/p", "/p/a.css", Contents::Null), done));
        assert!(task.poll().is_ready());
        assert!(rx.try_recv().unwrap().is_ok());
    }
}
