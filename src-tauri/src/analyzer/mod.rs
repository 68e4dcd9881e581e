//! Multimodal friction analysis: prompt contract, report type and the Gemini client.

pub mod client;
pub mod prompts;
pub mod types;

pub use client::{ClientSettings, GeminiClient, ReasoningService};
pub use prompts::AnalysisConfig;
pub use types::{parse_report, AnalysisReport};
