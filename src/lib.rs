//! PDF Extraction Gateway Library
//!
//! This crate provides an HTTP service that extracts structured content
//! from PDF uploads:
//! - `engine`: the Docling driver and the plain-text fallback reader
//! - `extract`: normalization of engine output into result envelopes
//! - `upload`: upload validation and the model catalog
//! - `server`: the axum routes

pub mod engine;
pub mod error;
pub mod extract;
pub mod server;
pub mod upload;

pub use error::{Error, Result};
pub use extract::{DoclingExtractor, ResultEnvelope};
pub use server::{
    build_extractor, create_router, run_server, run_server_with_config, ServerConfig,
};
