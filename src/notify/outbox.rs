//! Outbox consumption for absence notifications.
//!
//! The attendance workflow enqueues a row in `notification_outbox` inside the
//! same transaction as the attendance write; this module drains those rows in
//! the background. A row whose student has no usable notification preference
//! is marked `skipped` (expected, not an error). Delivery failures are logged
//! and retried on later passes until the attempt limit marks the row `failed`.
//! Nothing here ever reaches the user who recorded the attendance.

use std::time::Duration;

use crate::model::notification::OutboxEntry;
use crate::notify::mailer::Mailer;
use chrono::NaiveDate;
use sqlx::MySqlPool;

/// Rows picked up per polling pass.
const BATCH_SIZE: u32 = 20;

/// Queue one absence notification for (student, date).
///
/// Callers inside a transaction pass `&mut *tx` so the event commits or rolls
/// back together with the attendance write.
pub async fn enqueue<'e, E>(executor: E, student_id: u64, date: NaiveDate) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    sqlx::query("INSERT INTO notification_outbox (student_id, date) VALUES (?, ?)")
        .bind(student_id)
        .bind(date)
        .execute(executor)
        .await?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct Recipient {
    first_name: String,
    last_name: String,
    email: Option<String>,
    notify_on_absent: Option<bool>,
}

/// The destination address, if this recipient should be notified at all.
///
/// A missing preference row (both fields `None`), a blank address, or a
/// disabled `notify_on_absent` flag all mean "do not send".
fn usable_destination(recipient: &Recipient) -> Option<&str> {
    match (&recipient.email, recipient.notify_on_absent) {
        (Some(email), Some(true)) if !email.is_empty() => Some(email),
        _ => None,
    }
}

/// Poll-and-deliver loop; spawned once at startup when SMTP is configured.
pub async fn run_dispatcher(
    pool: MySqlPool,
    mailer: Mailer,
    poll_interval: Duration,
    max_attempts: u32,
) {
    tracing::info!(
        poll_secs = poll_interval.as_secs(),
        max_attempts,
        "Notification dispatcher started"
    );

    loop {
        if let Err(e) = drain_once(&pool, &mailer, max_attempts).await {
            tracing::error!(error = %e, "Outbox pass failed");
        }
        actix_web::rt::time::sleep(poll_interval).await;
    }
}

async fn drain_once(pool: &MySqlPool, mailer: &Mailer, max_attempts: u32) -> anyhow::Result<()> {
    let pending = sqlx::query_as::<_, OutboxEntry>(
        r#"
        SELECT id, student_id, date, attempts
        FROM notification_outbox
        WHERE state = 'pending' AND attempts < ?
        ORDER BY id
        LIMIT ?
        "#,
    )
    .bind(max_attempts)
    .bind(BATCH_SIZE)
    .fetch_all(pool)
    .await?;

    for entry in pending {
        process_entry(pool, mailer, &entry, max_attempts).await?;
    }

    Ok(())
}

async fn process_entry(
    pool: &MySqlPool,
    mailer: &Mailer,
    entry: &OutboxEntry,
    max_attempts: u32,
) -> anyhow::Result<()> {
    let recipient = sqlx::query_as::<_, Recipient>(
        r#"
        SELECT s.first_name, s.last_name, n.email, n.notify_on_absent
        FROM students s
        LEFT JOIN email_notifications n ON n.student_id = s.id
        WHERE s.id = ?
        "#,
    )
    .bind(entry.student_id)
    .fetch_optional(pool)
    .await?;

    let Some(recipient) = recipient else {
        // student row gone; nothing to deliver
        mark_skipped(pool, entry.id, "student not found").await?;
        return Ok(());
    };

    let Some(to_email) = usable_destination(&recipient) else {
        tracing::debug!(
            outbox_id = entry.id,
            student_id = entry.student_id,
            "No notification settings found; skipping"
        );
        mark_skipped(pool, entry.id, "no notification settings").await?;
        return Ok(());
    };

    match mailer
        .send_absence_notice(to_email, &recipient.first_name, &recipient.last_name, entry.date)
        .await
    {
        Ok(()) => {
            sqlx::query(
                "UPDATE notification_outbox SET state = 'sent', sent_at = NOW() WHERE id = ?",
            )
            .bind(entry.id)
            .execute(pool)
            .await?;
        }
        Err(e) => {
            let attempts = entry.attempts + 1;
            let state = if attempts >= max_attempts {
                "failed"
            } else {
                "pending"
            };

            tracing::warn!(
                outbox_id = entry.id,
                student_id = entry.student_id,
                attempts,
                state,
                error = %e,
                "Absence notification delivery failed"
            );

            sqlx::query(
                "UPDATE notification_outbox SET state = ?, attempts = ?, last_error = ? WHERE id = ?",
            )
            .bind(state)
            .bind(attempts)
            .bind(e.to_string())
            .bind(entry.id)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

async fn mark_skipped(pool: &MySqlPool, outbox_id: u64, reason: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE notification_outbox SET state = 'skipped', last_error = ? WHERE id = ?")
        .bind(reason)
        .bind(outbox_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(email: Option<&str>, notify: Option<bool>) -> Recipient {
        Recipient {
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            email: email.map(str::to_string),
            notify_on_absent: notify,
        }
    }

    #[test]
    fn sends_when_preference_is_enabled() {
        let r = recipient(Some("parent@example.com"), Some(true));
        assert_eq!(usable_destination(&r), Some("parent@example.com"));
    }

    #[test]
    fn missing_preference_row_is_a_noop() {
        let r = recipient(None, None);
        assert_eq!(usable_destination(&r), None);
    }

    #[test]
    fn disabled_preference_is_a_noop() {
        let r = recipient(Some("parent@example.com"), Some(false));
        assert_eq!(usable_destination(&r), None);
    }

    #[test]
    fn blank_address_is_a_noop() {
        let r = recipient(Some(""), Some(true));
        assert_eq!(usable_destination(&r), None);
    }
}
