//! # openswarm
//!
//! A self-hosted multi-agent coordination engine.
//!
//! Autonomous role-bound agents (manager, researcher, coder, critic)
//! cooperate through a shared task board and talk to each other over named
//! bus channels. A background work loop drives the system without external
//! stimulus.
//!
//! ## Architecture
//!
//! ```text
//!  WorkLoop ──reads──> TaskBoard
//!     │
//!     ▼ synthesized InboundMessage
//!  MessageBus ──routes──> Agent (bounded tool loop)
//!     ▲                      │
//!     │ send_message         ▼
//!     └───────────── ToolRegistry ──> TaskBoard / SubagentManager / files / shell / web
//!                            │
//!                            ▼
//!                      LlmClient (OpenRouter)
//! ```
//!
//! ## Modules
//! - `agent`: role-bound agents and the bounded execution loop
//! - `board`: shared, durable task board
//! - `bus`: channel-addressed message routing
//! - `config`: environment-driven runtime configuration
//! - `llm`: LLM client trait and OpenRouter implementation
//! - `subagent`: transient delegated workers
//! - `tools`: the agents' tool surface
//! - `work_loop`: the autonomous work-cycle scheduler

pub mod agent;
pub mod board;
pub mod bus;
pub mod config;
pub mod llm;
pub mod subagent;
pub mod tools;
pub mod work_loop;

pub use config::Config;
