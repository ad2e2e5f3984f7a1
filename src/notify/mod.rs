pub mod mailer;
pub mod outbox;
