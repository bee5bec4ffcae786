//! Driven adapters — platform implementations of the port traits.
//!
//! Everything that touches a filesystem, a radio, or an ESP-IDF API lives
//! here; the domain core only ever sees the traits in
//! [`crate::app::ports`].

pub mod display;
pub mod events;
pub mod hardware;
pub mod store;
pub mod time;
pub mod wifi;
