//! Bridge between the shell and the worker thread that owns the session controller.

pub mod commands;
pub mod runtime;
