// src/services/mod.rs
//! Envelope validation.

pub mod validator;
