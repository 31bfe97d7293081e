pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod report;
pub mod review;
#[doc(hidden)]
pub mod test_helpers;
pub mod web;
