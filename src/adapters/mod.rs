// Adapters layer: concrete implementations for external systems (http, storage).

pub mod openalex;
pub mod storage;

pub use openalex::OpenAlexClient;
pub use storage::LocalStorage;
