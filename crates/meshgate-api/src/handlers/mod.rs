//! REST API handlers

pub mod health;
pub mod keys;
pub mod overlay;
pub mod subnets;
