pub mod app;
pub mod calendar;
pub mod cli;
pub mod client;
pub mod config;
pub mod output;
pub mod query;
pub mod record;
pub mod session;
pub mod utils;

#[cfg(test)]
mod tests;
