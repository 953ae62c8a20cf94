//! JSON-lines control surface for a presentation layer.

pub mod handler;
pub mod serve;

pub use handler::{handle_intent, parse_intent, reply_err, reply_ok, Intent};
pub use serve::serve;
