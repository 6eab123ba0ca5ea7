pub mod document;
pub mod firestore;
pub mod memory;

pub use document::{
    Document, DocumentStore, Filter, Precondition, StoreError, Write,
};
