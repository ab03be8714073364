//! # Plume Core
//!
//! The engine behind Plume: takes a topic and turns it into a researched,
//! written, illustrated and published article.
//!
//! ## Architecture
//!
//! - `pipeline/` - Stage contract, orchestrator, payloads and the final report
//! - `agents/` - The research, writing, image curation and publishing stages
//! - `tools/` - HTTP clients for SearXNG, Unsplash and Medium
//! - `models/` - Centralized LLM provider configuration
//! - `config/` - Environment-driven runtime configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plume_core::config::Config;
//! use plume_core::pipeline::{Orchestrator, TopicRequest};
//!
//! let config = Config::from_env()?;
//! let mut orchestrator = Orchestrator::from_config(&config);
//! let report = orchestrator.run(TopicRequest::new("urban beekeeping")).await?;
//! ```

pub mod agents;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod retry;
pub mod summary;
pub mod tools;

pub use config::Config;
pub use models::{LlmProvider, ModelConfig};
pub use pipeline::{
    Orchestrator, PipelineReport, RunStatus, TopicRequest, WritingStyle,
};
pub use retry::RetryPolicy;
