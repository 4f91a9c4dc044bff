use std::collections::BTreeSet;

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streaks {
    /// Run of consecutive days ending today, or yesterday if today isn't recorded yet.
    pub current: u32,
    pub longest: u32,
    /// Number of distinct days recorded.
    pub total: u32,
}

/// Walks the sorted, de-duplicated days and measures runs of consecutive days. Days after `today`
/// don't count.
pub fn compute_streaks(dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> Streaks {
    let dates = dates
        .into_iter()
        .filter(|v| *v <= today)
        .collect::<BTreeSet<_>>();

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for date in &dates {
        run = match previous {
            Some(previous) if previous.succ_opt() == Some(*date) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*date);
    }

    let current = match previous {
        Some(last) if last == today || Some(last) == today.pred_opt() => run,
        _ => 0,
    };

    Streaks {
        current,
        longest,
        total: dates.len() as u32,
    }
}
