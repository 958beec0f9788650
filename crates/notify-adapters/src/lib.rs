//! # notify-adapters
//!
//! Implementations of `ReviewNotifier`. `LogNotifier` only records the event;
//! `ResendNotifier` (feature `email-resend`) emails the configured reviewers.

mod log;
pub mod template;

#[cfg(feature = "email-resend")]
mod resend;

pub use log::LogNotifier;
#[cfg(feature = "email-resend")]
pub use resend::ResendNotifier;
pub use template::PendingReviewEmail;
