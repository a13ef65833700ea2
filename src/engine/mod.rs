pub mod arbiter;
pub mod day;
pub mod decision;
pub mod graph;
pub mod llm_client;
pub mod narrator;
pub mod night;
pub mod parser;
pub mod prompt_builder;
pub mod rules;

#[cfg(test)]
pub mod testutil;
