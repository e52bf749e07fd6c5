//! LLM integration for summarizing transcripts
//!
//! Providers sit behind the [`Summarizer`] trait so the engine does not care
//! which generative-language API produced the bullet points.

mod summarizer;
mod providers;

pub use summarizer::{Summarizer, SummaryRequest, Summary};
pub use providers::create_summarizer;
