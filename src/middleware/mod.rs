pub mod auth;
pub mod response;
pub mod role;

pub use auth::{access_gate, AccessGate, CurrentUser, GateOutcome};
pub use response::{ApiResponse, ApiResult};
pub use role::require_role;
