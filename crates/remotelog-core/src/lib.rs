// # remotelog-core
//
// Core library for appending records to remote, versioned, append-only logs.
//
// ## Architecture Overview
//
// The remote store exposes no append primitive, only "read the whole object"
// and "write the whole object if nobody changed it". This library builds a
// safe append on top of that:
// - **codec**: base64 transport encoding and one-record-per-line framing
// - **RemoteLog**: trait for backends (fetch + conditional write, one round trip each)
// - **AppendOrchestrator**: fetch → append → conditional write, retrying on conflicts
// - **BackendRegistry**: plugin-based registry of backend factories
// - **record**: line formats for signups and contact messages
//
// ## Design Principles
//
// 1. **Remote is the arbiter**: ordering comes from the backend's version
//    check, never from client-side locks
// 2. **Retry lives in one place**: backends never retry, the orchestrator does
// 3. **Closed outcomes**: every failure becomes an `Outcome` variant before it
//    reaches the caller
// 4. **Library-First**: the binary is a thin layer over this crate

pub mod codec;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod record;
pub mod registry;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{AppendConfig, BackendConfig, DestinationConfig, RemoteLogConfig};
pub use error::{DecodeError, Error, RemoteError, Result};
pub use orchestrator::{AppendOrchestrator, AppendRequest, Outcome};
pub use record::{ContactMessage, LogRecord, Signup};
pub use registry::BackendRegistry;
pub use store::MemoryRemoteLog;
pub use traits::{Credentials, RemoteLog, RemoteObject, VersionToken};
