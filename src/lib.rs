//! Template relay
//!
//! Operators upload image templates into a Lark Base table; end users pick a
//! template, fill job slots from the same base, and their request is relayed
//! to an automation webhook that renders the final image.

pub mod app_state;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
