//! Client for the job-board API: a persisted session, an HTTP gateway that
//! carries it, and the view router that guards navigation on it.

pub mod gateway;
pub mod router;
pub mod session;

pub use gateway::{Gateway, GatewayError};
pub use router::{Navigation, Router, View};
pub use session::Session;
