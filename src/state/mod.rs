//! Client-side board state and the handlers that evolve it.
//!
//! SYSTEM CONTEXT
//! ==============
//! `board` holds the owned state struct the presentation surface reads, and
//! `update` holds the pure command/completion handlers the controller runs
//! against it.

pub mod board;
pub mod update;
