//! Networking modules for the remote task service.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` issues the REST calls for one board at a time and `types` defines
//! the shared wire schema used by both the client and the board state.

pub mod api;
pub mod types;
