// src/http/mod.rs

//! HTTP side: the conditional responder and a small blocking host.

pub mod responder;
pub mod server;

pub use responder::{ResponseDescriptor, respond};
