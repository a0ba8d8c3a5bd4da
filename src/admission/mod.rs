// Admission control
// Decides whether to begin processing a request before committing resources.

pub mod gate;
pub mod rate_limit;

pub use gate::{AdmissionPermit, ConcurrencyGate};
pub use rate_limit::RateLimiter;
