pub mod audit;
pub mod chunk;
pub mod client;
pub mod compress;
pub mod config;
pub mod daily;
pub mod merge;
pub mod normalize;
pub mod paths;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod state;
pub mod store;
pub mod summarizer;
pub mod util;

#[cfg(test)]
mod test_support;
