//! Multi-deployment LLM chat and side-by-side comparison.
//!
//! The core is [`compare::ComparisonRun`], a small state machine that sends
//! one prompt to a fixed list of variants strictly in order and stops at the
//! first failure. [`views`] instantiates it per deployment and per
//! temperature, [`binder`] turns it into display slots, and [`client`] talks
//! to the HTTP backend, including the embedding endpoints wrapped by
//! [`embedding`].

pub mod app;
pub mod binder;
pub mod chat;
pub mod cli;
pub mod client;
pub mod compare;
pub mod config;
pub mod embedding;
pub mod error;
pub mod providers;
pub mod render;
pub mod upload;
pub mod views;

#[cfg(test)]
mod test_support;

pub use client::{ChatBackend, ChatClient, ChatParams, Outcome};
pub use compare::{ComparisonRun, RunPhase, Step, Submission, Temperature, Variant};
pub use error::CompareError;
pub use providers::Deployment;
