//! Choosing one tactical candidate using what the libmap remembers.
//!
//! Two modes are available. `threshold` picks a random candidate but walks
//! past ones already proven weak. `ucb` ranks candidates by an upper
//! confidence bound over their remembered statistics mixed with a prior, and
//! can also rank the option of playing elsewhere.

use log::trace;

use crate::board::Move;
use crate::config::{LibmapConfig, PickMode};
use crate::libmap::LibmapStore;
use crate::queue::{LibmapQueue, QueuedMove};
use crate::stats::MoveStats;

/// Outcome of a pick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pick {
    /// Index of the chosen queue entry.
    Candidate(usize),
    /// Leave the local fight alone.
    Elsewhere,
}

fn remembered(store: &LibmapStore, q: &QueuedMove) -> Option<MoveStats> {
    store.move_stats(q.info.group, q.info.color, q.info.hash, q.mv)
}

/// Whether remembered statistics prove a move below the threshold.
fn proven_bad(stats: Option<MoveStats>, config: &LibmapConfig) -> bool {
    stats.is_some_and(|s| s.playouts >= config.pick_epsilon && s.value < config.pick_threshold)
}

fn pick_threshold(
    store: &LibmapStore,
    queue: &LibmapQueue,
    config: &LibmapConfig,
    rng: &mut fastrand::Rng,
) -> usize {
    let n = queue.len();
    let p = rng.usize(..n);
    if rng.f64() < config.explore_p {
        return p;
    }
    (0..n)
        .map(|k| (p + k) % n)
        .find(|&i| {
            queue
                .get(i)
                .is_some_and(|q| !proven_bad(remembered(store, q), config))
        })
        .unwrap_or(p)
}

#[inline]
fn urgency(s: &MoveStats, log_total: f64) -> f64 {
    if s.playouts == 0 {
        return f64::INFINITY;
    }
    s.value + (2.0 * log_total / s.playouts as f64).sqrt()
}

fn pick_ucb(
    store: &LibmapStore,
    queue: &LibmapQueue,
    config: &LibmapConfig,
    rng: &mut fastrand::Rng,
) -> Pick {
    let stats: Vec<MoveStats> = queue
        .iter()
        .map(|q| config.prior.merged(&remembered(store, q).unwrap_or_default()))
        .collect();

    // Playing elsewhere is judged by what passing did in the first
    // candidate's context.
    let tenuki = queue.get(0).filter(|_| config.tenuki).map(|q| {
        let pass = Move::pass(q.mv.color);
        let s = store
            .move_stats(q.info.group, q.info.color, q.info.hash, pass)
            .unwrap_or_default();
        config.tenuki_prior.merged(&s)
    });

    let total: u64 = stats
        .iter()
        .chain(tenuki.iter())
        .map(|s| u64::from(s.playouts))
        .sum();
    let log_total = (total.max(1) as f64).ln();

    let mut best = Vec::new();
    let mut best_urgency = f64::NEG_INFINITY;
    for (i, s) in stats.iter().enumerate() {
        let u = urgency(s, log_total);
        if u > best_urgency {
            best_urgency = u;
            best.clear();
        }
        if u == best_urgency {
            best.push(i);
        }
    }
    if let Some(s) = tenuki {
        if urgency(&s, log_total) > best_urgency {
            return Pick::Elsewhere;
        }
    }
    // Urgencies that never compare (NaN) leave nothing ranked.
    if best.is_empty() {
        return Pick::Candidate(0);
    }
    Pick::Candidate(best[rng.usize(..best.len())])
}

/// Pick one of the queued candidates.
///
/// Returns `None` for an empty queue, and with `avoid_bad` also when the
/// chosen candidate is proven below the threshold.
pub fn queue_pick(
    store: &LibmapStore,
    queue: &LibmapQueue,
    config: &LibmapConfig,
    rng: &mut fastrand::Rng,
) -> Option<Pick> {
    if queue.is_empty() {
        return None;
    }
    let pick = if queue.len() == 1 {
        Pick::Candidate(0)
    } else {
        match config.pick_mode {
            PickMode::Threshold => Pick::Candidate(pick_threshold(store, queue, config, rng)),
            PickMode::Ucb => pick_ucb(store, queue, config, rng),
        }
    };

    if let Pick::Candidate(i) = pick {
        let q = queue.get(i)?;
        if config.avoid_bad && proven_bad(remembered(store, q), config) {
            trace!("avoiding proven-bad {:?}", q.mv);
            return None;
        }
    }
    Some(pick)
}
