//! Infrastructure adapters for the domain ports.

pub mod http;
