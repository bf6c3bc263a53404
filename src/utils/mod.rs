// src/utils/mod.rs
//! Crypto suites, material encodings and signature primitives.

pub mod crypto;
pub mod encoding;
pub mod suites;
