//! Switch between Git identities and onboard an SSH key per identity.

pub mod app;
pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod identity;
pub mod manager;
pub mod menu;
pub mod process;
pub mod ssh;
pub mod storage;
pub mod validation;
pub mod wizard;

pub use error::AppError;
pub use identity::Identity;
