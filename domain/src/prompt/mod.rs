//! Prompt domain
//!
//! Templates for the prompts sent in each council round.

mod template;

pub use template::PromptTemplate;
