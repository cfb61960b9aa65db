// src/config/mod.rs
pub mod digest;
pub mod email;

pub use digest::{DigestConfig, FeedSource};
pub use email::EmailConfig;
