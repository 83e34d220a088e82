//! Object storage adapters
//!
//! Firebase Storage for published items, a local directory for offline work.

mod firebase;
mod local_disk;

pub use firebase::FirebaseStorage;
pub use local_disk::LocalDiskStore;
