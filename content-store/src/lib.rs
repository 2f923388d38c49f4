pub mod github;
pub mod memory;
pub mod metrics_defs;
pub mod store;

pub use github::{GithubStore, GithubStoreConfig};
pub use memory::MemoryStore;
pub use store::{ContentStore, Fetched, StoreError, VersionToken};
