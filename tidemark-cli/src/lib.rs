//! Tidemark CLI Library
//!
//! Command handlers behind the `tidemark` binary. The binary (main.rs) parses
//! arguments and opens the source; everything it prints goes through here.

pub mod commands;
