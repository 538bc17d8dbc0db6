//! Line-segmenting OCR server
//!
//! Pages are split into single text lines by horizontal projection
//! profiling ([`segmentation`]), each line is read by a pluggable OCR engine
//! ([`engines`]), and the results are served over HTTP ([`server`]).

pub mod annotate;
pub mod config;
pub mod document;
pub mod engine;
pub mod engines;
pub mod error;
pub mod segmentation;
pub mod server;
pub mod transcribe;
