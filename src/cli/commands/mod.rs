pub mod config;
pub mod draft;
pub mod extract;
pub mod mermaid;
