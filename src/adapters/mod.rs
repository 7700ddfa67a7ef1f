// Adapters layer: concrete implementations for external systems
// (kdbx databases, report storage).

pub mod storage;
pub mod vault;
