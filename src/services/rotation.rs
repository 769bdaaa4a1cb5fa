use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::ListItem;

/// When fewer unseen items than this remain, the shown set resets
pub const RESET_THRESHOLD: usize = 5;

/// Bounds for the random subset size returned per request
pub const MIN_PICK: usize = 10;
pub const MAX_PICK: usize = 20;

/// Outcome of one rotation pick
#[derive(Debug)]
pub struct Rotation {
    /// Items to return for this request, in shuffled order
    pub selected: Vec<ListItem>,
    /// Updated shown-ID set to store back in the cache
    pub shown_ids: Vec<u64>,
}

/// Picks a rotated subset of `pool`, biased away from recently shown items
///
/// Items whose IDs are in `shown_ids` are excluded. When fewer than
/// [`RESET_THRESHOLD`] unseen items remain, the shown set resets and the whole
/// pool becomes eligible again. The subset size is random within
/// [`MIN_PICK`]..=[`MAX_PICK`], bounded by the eligible count. An empty pool
/// yields an empty rotation with an empty shown set.
pub fn pick<R: Rng + ?Sized>(pool: &[ListItem], shown_ids: &[u64], rng: &mut R) -> Rotation {
    if pool.is_empty() {
        return Rotation {
            selected: Vec::new(),
            shown_ids: Vec::new(),
        };
    }

    let mut shown: Vec<u64> = shown_ids.to_vec();
    let mut available: Vec<&ListItem> = pool
        .iter()
        .filter(|item| !shown.contains(&item.id))
        .collect();

    if available.len() < RESET_THRESHOLD {
        shown.clear();
        available = pool.iter().collect();
    }

    let count = available.len().min(rng.gen_range(MIN_PICK..=MAX_PICK));
    available.shuffle(rng);

    let selected: Vec<ListItem> = available.into_iter().take(count).cloned().collect();
    shown.extend(selected.iter().map(|item| item.id));

    Rotation {
        selected,
        shown_ids: shown,
    }
}
