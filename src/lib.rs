// Staleguard: HTTP client cache validity engine and request coalescing

pub mod cache;
pub mod config;
pub mod constants;
pub mod logging;
pub mod request_coalescing;
