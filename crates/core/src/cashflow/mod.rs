//! Monthly cash-flow projections.

pub mod error;
pub mod service;
pub mod types;

pub use error::CashFlowError;
pub use service::CashFlowService;
pub use types::{CashFlowInput, CashFlowPeriod, CashFlowProjection, CashFlowSummary};
