//! Configuración del runner desde variables de entorno.
//!
//! Variables (todas opcionales):
//! - `CSSFLOW_OUT_DIR`: directorio de salida (por defecto `dist`).
//! - `CSSFLOW_BASE_DIR`: raíz contra la que se calculan rutas relativas (`.`).
//! - `CSSFLOW_SOURCEMAPS`: `1`/`true` para adjuntar y escribir source maps.
//! - `CSSFLOW_CONCURRENCY`: archivos en vuelo a la vez (`1`).
//! - `CSSFLOW_CONFIG`: ruta de configuración para el descubrimiento en disco.
//! - `CSSFLOW_QUIET`: `1`/`true` para no reportar advertencias ni diagnósticos.

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub out_dir: PathBuf,
    pub base_dir: PathBuf,
    pub sourcemaps: bool,
    pub concurrency: usize,
    pub quiet: bool,
    /// Valor de la opción `config` para el descubrimiento.
    pub config_path: Option<String>,
    /// Lista explícita de plugins; vacía = descubrir configuración en disco.
    pub plugins: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { out_dir: PathBuf::from("dist"),
               base_dir: PathBuf::from("."),
               sourcemaps: false,
               concurrency: 1,
               quiet: false,
               config_path: None,
               plugins: Vec::new() }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl RunnerConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let out_dir = lookup("CSSFLOW_OUT_DIR").map(PathBuf::from).unwrap_or(defaults.out_dir);
        let base_dir = lookup("CSSFLOW_BASE_DIR").map(PathBuf::from).unwrap_or(defaults.base_dir);
        let sourcemaps = lookup("CSSFLOW_SOURCEMAPS").map(|v| parse_flag(&v)).unwrap_or(false);
        let concurrency = lookup("CSSFLOW_CONCURRENCY").and_then(|v| v.parse().ok())
                                                       .filter(|n: &usize| *n > 0)
                                                       .unwrap_or(defaults.concurrency);
        let config_path = lookup("CSSFLOW_CONFIG").filter(|v| !v.is_empty());
        let quiet = lookup("CSSFLOW_QUIET").map(|v| parse_flag(&v)).unwrap_or(false);
        Self { out_dir, base_dir, sourcemaps, concurrency, quiet, config_path, plugins: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_without_variables() {
        assert_eq!(RunnerConfig::from_lookup(|_| None), RunnerConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let vars: HashMap<&str, &str> = [("CSSFLOW_OUT_DIR", "build"),
                                         ("CSSFLOW_SOURCEMAPS", "TRUE"),
                                         ("CSSFLOW_CONCURRENCY", "4"),
                                         ("CSSFLOW_QUIET", "yes"),
                                         ("CSSFLOW_CONFIG", "./cfg")].into_iter()
                                                                     .collect();
        let cfg = RunnerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.out_dir, PathBuf::from("build"));
        assert!(cfg.sourcemaps);
        assert_eq!(cfg.concurrency, 4);
        assert!(cfg.quiet);
        assert_eq!(cfg.config_path.as_deref(), Some("./cfg"));
    }

    #[test]
    fn invalid_concurrency_falls_back() {
        let cfg = RunnerConfig::from_lookup(|k| (k == "CSSFLOW_CONCURRENCY").then(|| "0".to_string()));
        assert_eq!(cfg.concurrency, 1);
    }
}
