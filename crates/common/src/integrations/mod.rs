//! Concrete bid and analytics adapters.

pub mod insticator;
pub mod insticator_analytics;
