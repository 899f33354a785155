//! css-core: transform CSS por archivo sobre un stream de registros.
pub mod classify;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod model;
pub mod options;
pub mod paths;
pub mod report;
pub mod sourcemap;
pub mod transform;

pub use classify::classify;
pub use config::{ConfigCallback, ConfigDiscovery, ConfigSource, DiscoveryContext, ResolvedConfig};
pub use engine::Engine;
pub use errors::{BoxError, ConfigError, CssSyntaxError, EngineError, PluginError, SourceMapError, TransformError};
pub use model::{Contents, EngineOutput, FileRecord, MapOption, ProcessOptions, SourceMap, Warning};
pub use options::{merge_options, ProtectedKeys, Rejection};
pub use report::{LogReporter, Reporter, SilentReporter};
pub use sourcemap::{ReplaceApplier, SourceMapApplier};
pub use transform::{Completion, CssTransform, Done, TransformStream};
