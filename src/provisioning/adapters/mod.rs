//! Adapter implementations for provisioning ports.

pub mod http;
pub mod memory;
pub mod postgres;
pub mod providers;
