// Adapters layer: concrete implementations of the domain ports plus the HTTP transport.

pub mod customer_file;
pub mod http;
pub mod memory_cache;
pub mod notifier;

pub use customer_file::CustomerFileParser;
pub use memory_cache::InMemoryFilterCache;
pub use notifier::LogNotifier;
