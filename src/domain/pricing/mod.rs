//! Pricing Module - Pure computation of membership amounts.
//!
//! No ports or adapters: every function takes catalog records and dates and
//! returns an amount.
//!
//! - `PricingEngine` - totals and extension costs
//! - `proration` - refund/plan-change proration and minor-unit rounding

mod engine;
pub mod proration;

pub use engine::{PricingEngine, PricingError};
pub use proration::{
    cancellation_refund, round_minor, to_minor_units, AdjustmentAction, PeriodPosition,
    PlanChangeQuote,
};
