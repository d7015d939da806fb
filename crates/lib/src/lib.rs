//! stratus-lib: Core types and logic for Stratus
//!
//! This crate provides the synthesis pipeline and the types it runs on:
//! - `Providers`: the external facts a run draws from (identity, config,
//!   bootstrap resources, state directory)
//! - `App`: the mutable application model a resource definition builds up
//! - `ContextStore`: cached synthesis decisions persisted across runs
//! - `Assembly`: the finalized, deterministic output of one run

pub mod app;
pub mod assembly;
pub mod consts;
pub mod context;
pub mod environment;
pub mod providers;
pub mod synth;
pub mod util;
