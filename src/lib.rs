pub mod buckets;
pub mod config;
pub mod fetch;
pub mod identifiers;
pub mod output;
pub mod parser;
pub mod scale;
pub mod session;
pub mod traffic;
pub mod types;
pub mod window;
