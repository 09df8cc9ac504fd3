//! Command handlers.
//!
//! Each handler is a thin `execute(ctx, ...)` wrapper: it calls into the
//! runtime and formats the result for the terminal.

pub mod interpreters;
pub mod python;
