pub mod batch;
pub mod client;
pub mod dedupe;
pub mod error;
pub mod presence;
pub mod retry;
pub mod types;

pub use batch::{BatchExecutor, StopFlag};
pub use client::{Directory, DirectoryClient};
pub use dedupe::dedupe;
pub use error::DirectoryError;
pub use presence::PresenceFilter;
