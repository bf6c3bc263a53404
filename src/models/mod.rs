// src/models/mod.rs
//! Typed views over the JSON inputs of an envelope.

pub mod did;
pub mod document;
pub mod instruction;
pub mod json;
