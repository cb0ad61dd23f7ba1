use crate::domain::radar::Month;
use anyhow::Context;

// Advisory locks are scoped to the Postgres session. Guards against two refreshes
// writing the same month concurrently.
const LOCK_NAMESPACE: i64 = 0x5241_4441_5200; // "RADAR"

fn lock_key_for_month(month: Month) -> i64 {
    LOCK_NAMESPACE ^ (i64::from(month.year()) * 12 + i64::from(month.month()))
}

/// Both calls must run on the same connection: the lock belongs to the session
/// that took it, and unlocking from another session is a no-op.
pub async fn try_acquire_month_lock(
    conn: &mut sqlx::PgConnection,
    month: Month,
) -> anyhow::Result<bool> {
    let key = lock_key_for_month(month);
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={key})"))?;
    Ok(acquired.0)
}

/// Returns whether the session actually held the lock.
pub async fn release_month_lock(
    conn: &mut sqlx::PgConnection,
    month: Month,
) -> anyhow::Result<bool> {
    let key = lock_key_for_month(month);
    let released: (bool,) = sqlx::query_as("SELECT pg_advisory_unlock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to release advisory lock (key={key})"))?;
    Ok(released.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_keys_differ_per_month() {
        let a = Month::parse("2026-01").unwrap();
        let b = Month::parse("2025-12").unwrap();
        assert_ne!(lock_key_for_month(a), lock_key_for_month(b));
        assert_eq!(lock_key_for_month(a), lock_key_for_month(Month::parse("2026-01").unwrap()));
    }
}
