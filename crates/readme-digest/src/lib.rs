// Public modules
pub mod builder;
pub mod client;
pub mod config;
pub mod document;
pub mod fetch;
pub mod github;
pub mod models;
pub mod render;
pub mod til;

// Re-export commonly used types
pub use builder::{Digest, DigestBuilder, NotesSource};
pub use client::ApiClient;
pub use config::Config;
pub use document::{replace_chunk, Document, SpliceError, SpliceMode};
pub use fetch::{fetch_list, fetch_related, select_latest, ListOptions, ListRecord, DEFAULT_LIMIT};
pub use github::{GitHubClient, Repository};
pub use models::{FailurePolicy, Item, Release, Section, SortKey};
pub use render::render;
pub use til::TilClient;
