// # Remote Log Implementations
//
// Backends that live inside the core crate. Network backends ship as
// separate crates (see `remotelog-github`).

pub mod memory;

pub use memory::{MemoryRemoteLog, MemoryRemoteLogFactory};
