//! Scout Search - search API access, page fetching and result aggregation

pub mod aggregator;
pub mod denylist;
pub mod fetch;
pub mod html;
pub mod orchestrator;
pub mod tavily;

pub use aggregator::ResultsContainer;
pub use denylist::{is_denylisted, URL_DENYLIST};
pub use fetch::{FetchReport, FetchWorker, HttpRenderer};
pub use html::{clean_html, Html2MdConverter};
pub use orchestrator::{auxiliary_query, format_query, rescale_score, SearchOrchestrator};
pub use tavily::TavilyClient;
