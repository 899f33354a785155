//! css-adapters: implementaciones concretas de los colaboradores del core.
//!
//! - `engine`: motor de referencia (`RuleEngine`) con parser y serializador.
//! - `plugins`: trait `CssPlugin` y plugins incluidos.
//! - `registry`: plugins por nombre para configuración en disco y CLI.
//! - `discovery`: `FsConfigDiscovery`, búsqueda de `.cssflowrc`.
//! - `applier`: `ComposingApplier`, composición de source maps.

pub mod applier;
pub mod discovery;
pub mod engine;
pub mod plugins;
pub mod registry;

pub use applier::ComposingApplier;
pub use discovery::FsConfigDiscovery;
pub use engine::RuleEngine;
pub use plugins::{AsyncDoubler, CssPlugin, Doubler, PluginContext, PluginSet, SharedPlugin, StripComments, WarnEmptyRules};
pub use registry::{PluginRegistry, RegistryError};
