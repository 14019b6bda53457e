//! Kanban board client for the task-tracking REST service.
//!
//! A [`controller::BoardController`] owns the board state for one of two
//! remote boards and is driven through a cloneable
//! [`controller::BoardHandle`]. State transitions live in [`state::update`]
//! as pure functions; the controller executes the remote calls and clipboard
//! writes they request.

pub mod clipboard;
pub mod config;
pub mod controller;
pub mod net;
pub mod render;
pub mod state;
