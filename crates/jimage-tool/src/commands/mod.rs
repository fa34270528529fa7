//! Command handlers

pub mod build;
pub mod extract;
pub mod info;
pub mod list;
pub mod verify;
