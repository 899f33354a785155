pub mod file;
pub mod options;
pub mod result;
pub mod source_map;

pub use file::{Contents, FileRecord};
pub use options::{MapOption, ProcessOptions};
pub use result::{EngineOutput, Warning};
pub use source_map::{SourceMap, Segment, OriginalPosition};
