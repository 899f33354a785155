//! cssflow Rust Library
//!
//! Capa de aplicación sobre `css-core` y `css-adapters`:
//! - `errors`: errores del runner.
//! - `config`: configuración desde variables de entorno (.env).
//! - `runner`: lectura de archivos, stream de transformación y escritura.
//!
//! La usa el binario `cssflow`.

pub mod config;
pub mod errors;
pub mod runner;

pub use config::RunnerConfig;
pub use errors::CoreError;
pub use runner::{run, RunSummary};
