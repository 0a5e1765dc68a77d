//! Device-side progress core: local persistence, the progress service client
//! and reconciliation between the two.

pub mod events;
pub mod reconciler;
pub mod remote;
pub mod session;
pub mod store;

pub use events::{EventLedger, ProgressEvent};
pub use reconciler::SyncReport;
pub use remote::{HttpProgressClient, RemoteProgress};
pub use session::ProgressSync;
pub use store::{FileStore, KeyValueStore, MemoryStore, ProgressStore};
