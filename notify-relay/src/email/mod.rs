//! Email-Notify Relay.
//!
//! ```text
//! NotificationRequest → Notification → render() → EmailSender → provider API
//! ```

pub mod sender;
pub mod template;
pub mod types;

pub use sender::{EmailSender, ResendSender};
pub use template::{format_reading, render};
pub use types::{Notification, NotificationRequest, OutboundEmail, Reading};
