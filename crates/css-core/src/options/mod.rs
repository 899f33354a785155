//! Fusión de opciones: defaults del pipeline + opciones resueltas.
pub mod merge;

pub use merge::{merge_options, MergeOutcome, ProtectedKeys, Rejection};
