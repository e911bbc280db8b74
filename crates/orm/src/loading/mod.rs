//! Loading System - Batch ("eager") relation resolution

pub mod eager_loader;

pub use eager_loader::EagerLoader;
