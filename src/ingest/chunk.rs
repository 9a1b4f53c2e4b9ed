//! Calendar-month chunking of custom date ranges.
//!
//! A chunk spans at most one calendar month. Chunks are consecutive, never overlap
//! and together cover every day of `[start, end]`.

use chrono::{Days, Months, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Chunk {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// `date + 1 month`, clamped to the last day of the target month.
fn add_month(date: NaiveDate) -> NaiveDate {
    date.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX)
}

fn next_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(1))
}

/// Split `[start, end]` (inclusive days, `start <= end`) into month-sized chunks.
///
/// A range with `end <= start + 1 month` yields exactly one chunk.
pub(crate) fn plan_chunks(start: NaiveDate, end: NaiveDate) -> Vec<Chunk> {
    let mut out = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let month_later = add_month(cursor);
        let chunk_end = if month_later >= end {
            end
        } else {
            month_later.pred_opt().unwrap_or(cursor)
        };
        out.push(Chunk {
            start: cursor,
            end: chunk_end,
        });
        match next_day(chunk_end) {
            Some(n) => cursor = n,
            None => break,
        }
    }
    out
}
