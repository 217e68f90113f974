// ABOUTME: Notification seams for Tandem: in-process event broadcast and email
// ABOUTME: Both are best-effort collaborators; the database row is the source of truth

pub mod broadcast;
pub mod mailer;

pub use broadcast::{Event, ProjectEvents};
pub use mailer::{LogMailer, MailError, Mailer, OutboundEmail};
