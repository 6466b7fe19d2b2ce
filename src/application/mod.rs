//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

mod context;
pub mod handlers;
mod lifecycle_manager;
mod locks;
mod timed_gateway;

pub use context::{IssuedRefund, LifecycleContext, RefundRun, Selection};
pub use lifecycle_manager::{LifecycleSettings, MembershipLifecycleManager};
pub use locks::KeyedLocks;
pub use timed_gateway::TimedPaymentGateway;
