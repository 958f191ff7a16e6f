//! HTTP handlers
//!
//! Thin mapping from routes to the presence tracker and message log.

pub mod messages;
pub mod participants;
pub mod status;
pub mod validate;

pub use messages::{delete as delete_message, feed as get_messages, send as post_message};
pub use participants::{list as list_participants, register as register_participant};
pub use status::heartbeat;
