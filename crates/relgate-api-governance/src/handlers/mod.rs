//! HTTP handlers for the governance API.

pub mod cab_exceptions;
pub mod cab_requests;
pub mod maturity;
