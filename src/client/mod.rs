//! Consumers of this service's own HTTP API.

pub mod options_cache;
