// src/config/mod.rs
pub mod digest;

pub use digest::{
    DeliveryConfig, DigestConfig, FilterConfig, FormatConfig, ItemCount, RetryConfig, Secrets,
    SelectionConfig, SourcesConfig, StoreConfig,
};
