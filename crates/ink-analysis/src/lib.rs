//! Streaming article-analysis pipeline
//!
//! Takes an article through cache probe, quota and billing gates, prompt
//! assembly, and an OpenAI-compatible chat upstream, then hands back a
//! normalized byte stream tagged with how it was produced.

#![allow(clippy::must_use_candidate)]

mod client;
mod error;
mod orchestrator;
mod persist;
mod prompt;
mod search;
mod stream;
mod text;
mod types;

pub use client::{ChatClient, UpstreamEvent, UpstreamResponse, UpstreamStream};
pub use error::AnalysisError;
pub use orchestrator::{AnalysisOrchestrator, AnalysisReply, AnalysisRequest};
pub use persist::ResultPersister;
pub use search::SearchClient;
pub use stream::BodyStream;
pub use text::{analysis_cache_key, extract_result, normalize_text};
pub use types::StreamMode;
