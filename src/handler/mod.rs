//! Request handler module
//!
//! Decides per request whether the caller gets the install script or a
//! redirect to the project page.

pub mod classify;
pub mod router;

// Re-export main entry points
pub use classify::{classify, classify_user_agent, user_agent, ClientKind};
pub use router::{handle_request, respond, script_request, REDIRECT_TARGET, SCRIPT_PATH};
