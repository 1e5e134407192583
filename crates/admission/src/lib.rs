//! Request admission control for the enrichment entry point.
//!
//! Fixed-window counters (minute + hour) per client, plus stricter
//! per-operation overrides checked on top of the global limits.

pub mod clock;
pub mod controller;
pub mod error;
pub mod identity;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{AdmissionController, AdmissionDecision};
pub use error::RateLimited;
pub use identity::{normalize_path, resolve_client_key};
pub use window::{Scope, Window};
