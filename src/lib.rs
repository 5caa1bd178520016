//! Ghostflow - finds informal, repetitive work in operational records.
//!
//! Uploaded logs, CSV exports and spreadsheets are flattened to text,
//! bounded, and sent to a generative model that returns a structured
//! estimate of wasted effort and automation suggestions.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod server;

pub use analysis::AnalysisResult;
pub use config::{AnalyzerConfig, Config};
pub use error::AnalysisError;
pub use pipeline::{Analyzer, UploadedArtifact};
