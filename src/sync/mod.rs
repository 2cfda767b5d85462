//! Remote sync
//!
//! Queued mutations live in a requests file grouped by method and table.
//! Each one is sent to the remote API; accepted changes are mirrored into
//! the `LocalStore` so the JSON mirror stays consistent with the remote.

pub mod requests;
pub mod remote;
pub mod replay;

pub use requests::{Method, MethodRequests, RequestQueue, TableRequests};
pub use remote::{HttpMethod, HttpRemote, RemoteApi, RemoteResponse, RequestDescriptor};
pub use replay::{ping, sync_files, Outcome, Replayer, SyncReport};
