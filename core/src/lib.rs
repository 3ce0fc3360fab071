//! Turn-based clan battles: squads of units take orders, change health
//! state, and whole sessions can be checkpointed and restored.

pub mod action;
pub mod checkpoint;
pub mod clock;
pub mod command;
pub mod command_log;
pub mod config;
pub mod decision;
pub mod error;
pub mod generator;
pub mod receiver;
pub mod rng;
pub mod router;
pub mod session;
pub mod squad;
pub mod store;
pub mod types;
pub mod unit;
