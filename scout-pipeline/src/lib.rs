//! Scout Pipeline - query planning, synthesis and the search pipeline controller
//!
//! The controller ties the search, fetch and knowledge components together
//! for the two strategies:
//!
//! - **search**: plan queries, search without page content, answer from the
//!   search API's own summaries
//! - **deepsearch**: decompose the prompt into tasks, gather page content for
//!   each, rank it in an in-memory knowledge base and answer from the best
//!   passages

pub mod controller;
pub mod credentials;
pub mod debug;
pub mod error;
pub mod planner;
pub mod prompts;
pub mod synthesizer;

pub use controller::{Collaborators, PipelineController};
pub use credentials::{validate_keys, validate_llm_key, validate_search_key};
pub use debug::{write_debug_file, DebugRecord, SearchMode};
pub use error::{PipelineError, PipelineResult};
pub use planner::{split_queries, split_tasks, QueryPlan, QueryPlanner, MAX_AUXILIARY_QUERIES};
pub use prompts::PromptLibrary;
pub use synthesizer::Synthesizer;
