pub mod config;
pub mod errors;
pub mod graph;
pub mod input;
pub mod llm;
pub mod logging;
pub mod narrator;
pub mod phase;
pub mod prompts;
pub mod selector;
pub mod session;
pub mod ui;
