//! Hiring-manager tools. Interview creation is in-memory; candidate tracking is a stub.

pub mod handlers;
pub mod interviews;
