//! # formcheck CLI
//!
//! Thin file-based front end for `formcheck-core`. Argument parsing lives
//! in `main.rs`; each subcommand module exposes its `Args` struct and a
//! `run` function that writes to a caller-supplied sink, so commands can be
//! exercised without a process boundary.
//!
//! ## Subcommands
//!
//! - `validate` - check a submission against a schema
//! - `lint` - report authoring mistakes in a schema
//! - `rules` - list the registered rules and their message templates

pub mod input;
pub mod lint;
pub mod rules;
pub mod validate;
