//! Lead enrichment through Bright Data and LLM-written outreach messages.

pub(crate) mod brightdata;
pub(crate) mod llm;
pub(crate) mod pipeline;

pub use brightdata::{BrightDataClient, Submission};
pub use llm::LlmClient;
pub use pipeline::{
    build_prompt, merge_leads, PersonalizationPipeline, Prospect, PERSONALIZED_LEAD_COLUMNS,
};
