use serde::Serialize;

/// Result of greedy budget packing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackOutcome<T> {
    /// Selected items, in ranked order
    pub selected: Vec<T>,
    pub used: usize,
    /// Items left out because they did not fit the remaining budget
    pub skipped: usize,
    /// Skipped items whose cost alone exceeds the whole budget
    pub oversized: usize,
}

/// Greedy packing in ranked order.
///
/// An item that would overflow is skipped and packing continues, so a smaller
/// lower-ranked item can still fill the gap. Items are never truncated: the
/// sum of selected costs is always `<= budget`.
pub fn pack<T, F>(ranked: impl IntoIterator<Item = T>, budget: usize, cost_of: F) -> PackOutcome<T>
where
    F: Fn(&T) -> usize,
{
    let mut outcome = PackOutcome {
        selected: Vec::new(),
        used: 0,
        skipped: 0,
        oversized: 0,
    };

    for item in ranked {
        let cost = cost_of(&item);
        if cost > budget {
            outcome.skipped += 1;
            outcome.oversized += 1;
            continue;
        }
        // used <= budget holds throughout
        if cost > budget - outcome.used {
            outcome.skipped += 1;
            continue;
        }
        outcome.used += cost;
        outcome.selected.push(item);
    }

    outcome
}
