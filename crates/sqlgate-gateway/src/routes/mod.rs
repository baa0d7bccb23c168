//! HTTP route handlers.

pub mod delete;
pub mod health;
pub mod insert;
pub mod permissions;
pub mod select;
pub mod update;
