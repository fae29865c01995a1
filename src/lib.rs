//! sessionctl library crate.
//!
//! This library provides the client side of a terminal session daemon:
//! - Daemon transport and command protocol
//! - Session directory, reference resolution and the row-action list
//! - Pluggable attach backends
//! - Terminal UI components for the interactive session table

pub mod app;
pub mod attach;
pub mod cli;
pub mod compose;
pub mod config;
pub mod daemon;
pub mod directory;
pub mod error;
pub mod event_loop;
pub mod handlers;
pub mod list;
pub mod resolver;
pub mod screen;
pub mod ui;
