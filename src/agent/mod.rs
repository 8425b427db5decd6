//! Built-in computation agents
//!
//! Agents run inside the server process and consume the same task queue that
//! external workers poll over HTTP.

pub mod runner;

pub use runner::{spawn_agents, AgentLoop};
