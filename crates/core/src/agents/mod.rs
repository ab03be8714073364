//! The collaborator agents filling the four pipeline stages.

pub mod audience;
pub mod image_curator;
pub mod llm_helpers;
pub mod publisher;
pub mod researcher;
pub mod writer;

pub use audience::{AudienceStrategist, ReaderPersona};
pub use image_curator::ImageAgent;
pub use publisher::PublisherAgent;
pub use researcher::ResearchAgent;
pub use writer::WriterAgent;
