//! Schema-driven form validation.
//!
//! A [`FormSchema`](schema::FormSchema) declares fields, their rules and
//! conditional activation, plus cross-field invariants. A
//! [`ValidationEngine`](engine::ValidationEngine) checks submitted values
//! against it and returns a [`ValidationResult`](result::ValidationResult).
//! Pure and in-memory: no persistence, no I/O outside the optional
//! uniqueness lookup.

pub mod condition;
pub mod config;
pub mod cross_field;
pub mod engine;
pub mod error;
pub mod extension;
pub mod field;
pub mod file;
pub mod lookup;
pub mod result;
pub mod rules;
pub mod schema;
pub mod types;
pub mod value;
