// crates/cfdot-core/src/lib.rs - Core library for the cfdot diagnostic tool
//
// Everything the CLI needs that is not argument parsing or output:
//
// ┌──────────────┐    ┌──────────────────┐    ┌──────────────────────────┐
// │    config    │───▶│     factory      │───▶│ bbs / locket / rep       │
// │ (flag → env  │    │ (plain, TLS,     │    │ (capability traits and   │
// │  → default)  │    │  mutual TLS)     │    │  their HTTP clients)     │
// └──────────────┘    └──────────────────┘    └──────────────────────────┘
//          │                                              │
//          └──────────────▶ error (exit codes) ◀──────────┘
//
// The binary crate owns dispatch and stdout; this crate never prints.

pub mod bbs;
pub mod config;
pub mod deadline;
pub mod error;
pub mod factory;
pub mod locket;
pub mod rep;
pub mod tls;

pub use bbs::{EventEnvelope, EventSource, HttpRecordStore, RecordFilter, RecordStore};
pub use config::{Config, RawOptions};
pub use deadline::{TIMEOUT_MESSAGE, with_deadline};
pub use error::{CfdotError, CfdotResult, ErrorKind};
pub use factory::ClientFactory;
pub use locket::{HttpLockService, LockRequest, LockService, Resource, ResourceType};
pub use rep::{CellWorker, CellWorkerFactory, HttpCellWorker, RepClientFactory};
