//! Canal de diagnósticos no fatales.
//!
//! Todo lo que el transform reporta (advertencias del motor, claves
//! rechazadas) sale por un `Reporter` con la etiqueta `cssflow:`. La
//! implementación por defecto escribe en el facade `log`.

use std::path::Path;

use log::{info, warn};

use crate::constants::PLUGIN_NAME;
use crate::model::Warning;
use crate::paths;

pub trait Reporter: Send + Sync {
    fn info(&self, tag: &str, message: &str);
}

/// Reporter por defecto basado en `log`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, tag: &str, message: &str) {
        info!("{tag} {message}");
    }
}

/// Reporter que descarta todo.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn info(&self, _tag: &str, _message: &str) {}
}

pub fn tag() -> String {
    format!("{PLUGIN_NAME}:")
}

/// Una única llamada por archivo: advertencias unidas por salto de línea y
/// seguidas de ` (<ruta relativa>)`. Sin advertencias no se reporta nada.
pub fn report_warnings(reporter: &dyn Reporter, warnings: &[Warning], relative: &Path) {
    if warnings.is_empty() {
        return;
    }
    let joined = warnings.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n");
    let message = format!("{joined} ({})", paths::to_slash(relative));
    warn!("{} warning(s) for {}", warnings.len(), relative.display());
    reporter.info(&tag(), &message);
}

pub fn report_diagnostic(reporter: &dyn Reporter, message: &str) {
    reporter.info(&tag(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<(String, String)>>);

    impl Reporter for Capture {
        fn info(&self, tag: &str, message: &str) {
            self.0.lock().unwrap().push((tag.to_string(), message.to_string()));
        }
    }

    #[test]
    fn warnings_are_joined_in_a_single_call() {
        let capture = Capture::default();
        let warnings = vec![Warning::new("msg1"), Warning::new("msg2")];
        report_warnings(&capture, &warnings, Path::new("fixture.css"));
        let calls = capture.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("cssflow:".to_string(), "msg1\nmsg2 (fixture.css)".to_string()));
    }

    #[test]
    fn no_warnings_no_call() {
        let capture = Capture::default();
        report_warnings(&capture, &[], Path::new("fixture.css"));
        assert!(capture.0.lock().unwrap().is_empty());
    }
}
