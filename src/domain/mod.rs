// Domain layer: credential models, comparison rules, and ports (interfaces).
// No external systems here; kdbx files and the filesystem live in adapters.

pub mod diff;
pub mod model;
pub mod ports;
