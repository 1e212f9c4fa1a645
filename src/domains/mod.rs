//! Domains module containing business logic organized by bounded contexts.
//!
//! Tools are the only capability this server exposes.

pub mod tools;
