//! Document persistence adapters

mod firestore;

pub use firestore::FirestoreDocumentStore;
