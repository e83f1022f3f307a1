//! # Engine Module
//!
//! Runtime core. This module contains:
//! - Entity handles and the component registry
//! - Column storage and the store
//! - Query construction and evaluation
//! - Deferred commands
//! - Systems, stages and the scheduler
//! - The lifecycle pattern and collision dispatch built on top of them
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod component;
pub mod storage;
pub mod entity;
pub mod template;
pub mod store;
pub mod query;
pub mod commands;
pub mod systems;
pub mod scratch;
pub mod scheduler;
pub mod random;
pub mod lifecycle;
pub mod collision;
