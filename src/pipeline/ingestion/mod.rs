// Pipeline ingestion: reading the registry export into raw incident records

pub mod loader;

pub use loader::{fingerprint_file, load_incidents, LoadedTable, LoaderConfig};
