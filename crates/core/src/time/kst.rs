use crate::domain::radar::Month;
use anyhow::Context;
use chrono::{DateTime, FixedOffset, Utc};

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Calendar month `now_utc` falls in, as observed in Korea.
pub fn current_month(now_utc: DateTime<Utc>) -> anyhow::Result<Month> {
    let kst = FixedOffset::east_opt(KST_OFFSET_SECS).context("invalid KST offset")?;
    Month::from_date(now_utc.with_timezone(&kst).date_naive())
}

/// Sales figures are published after month close, so the default view is the prior month.
pub fn default_month(now_utc: DateTime<Utc>) -> anyhow::Result<Month> {
    current_month(now_utc)?
        .pred()
        .context("no month precedes the current one")
}

/// The `count` months before the current one, newest first.
pub fn recent_months(now_utc: DateTime<Utc>, count: usize) -> anyhow::Result<Vec<Month>> {
    trailing_months(default_month(now_utc)?, count)
}

/// `count` consecutive months ending at `last`, newest first.
pub fn trailing_months(last: Month, count: usize) -> anyhow::Result<Vec<Month>> {
    let mut out = Vec::with_capacity(count);
    let mut month = Some(last);
    for _ in 0..count {
        let m = month.with_context(|| format!("ran out of months before {last}"))?;
        out.push(m);
        month = m.pred();
    }
    Ok(out)
}
