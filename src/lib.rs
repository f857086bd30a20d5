//! FUNDFLOW Fund Allocation Library
//!
//! This library allocates a liquid-asset request (an amount of a currency
//! needed in a destination account) across a prioritized set of heterogeneous
//! funding sources, draining each source in priority order until the request
//! is satisfied or every source is exhausted.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
