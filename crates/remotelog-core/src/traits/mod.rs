//! Core traits for remotelog
//!
//! - [`RemoteLog`]: fetch and conditionally write a remote versioned object

pub mod remote_log;

pub use remote_log::{Credentials, RemoteLog, RemoteLogFactory, RemoteObject, VersionToken};
