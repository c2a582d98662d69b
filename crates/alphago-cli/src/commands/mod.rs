pub mod clear;
pub mod common;
pub mod config;
pub mod create;
pub mod delete;
pub mod list;
pub mod pending;
pub mod refresh;
pub mod status;
pub mod sync;
pub mod update;
