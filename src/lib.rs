pub mod config;
pub mod extract;
pub mod fetch; // StaticFetcher lives here for integration tests
pub mod generate;
pub mod ident;
pub mod import;
pub mod links;
pub mod metadata;
pub mod observability;
pub mod pipeline;
