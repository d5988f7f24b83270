//! Percentage-share arithmetic for split containers (§3 invariant 3, §4.1
//! `resize`). Mirrors `cmd_resize_tiling_direction` / `cmd_resize_tiling_width_height`
//! in the original `commands.c`: the minimum share a child may hold is `0.05`,
//! checked with a strict epsilon comparison so a resize that would land
//! exactly on the boundary is rejected rather than silently clamped.

/// Minimum fraction of a parent's packing axis any child may occupy.
pub const MIN_SHARE: f64 = 0.05;

const EPSILON: f64 = 1e-9;

fn definitely_greater_than(a: f64, b: f64) -> bool {
    a > b + EPSILON
}

/// Attempt to move `delta` share from `second` into `first` (a positive delta
/// grows `first` and shrinks `second`). Returns the new `(first, second)`
/// pair, or `None` if either side would fall to or below [`MIN_SHARE`].
pub fn clamp_resize(first: f64, second: f64, delta: f64) -> Option<(f64, f64)> {
    let new_first = first + delta;
    let new_second = second - delta;
    if definitely_greater_than(new_first, MIN_SHARE) && definitely_greater_than(new_second, MIN_SHARE) {
        Some((new_first, new_second))
    } else {
        None
    }
}

/// Recompute shares after inserting a new child into a parent that already
/// had `existing.len()` children summing to ~1.0. The new child receives
/// `1/(n+1)`; existing children are scaled proportionally so the sum stays 1.
pub fn rebalance_insert(existing: &[f64]) -> (Vec<f64>, f64) {
    let n = existing.len();
    if n == 0 {
        return (Vec::new(), 1.0);
    }
    let new_share = 1.0 / (n as f64 + 1.0);
    let scale = 1.0 - new_share;
    let scaled = existing.iter().map(|p| p * scale).collect();
    (scaled, new_share)
}

/// Recompute shares after removing one child: the removed child's share is
/// redistributed proportionally among the remaining siblings. `removed` is
/// the share the departing child held; `remaining` are the other children's
/// current shares (which do not yet sum to 1.0).
pub fn rebalance_detach(remaining: &[f64], removed: f64) -> Vec<f64> {
    let total_remaining: f64 = remaining.iter().sum();
    if total_remaining <= f64::EPSILON {
        // All children had ~zero share (shouldn't happen under invariant 3,
        // but divide evenly rather than divide by zero).
        let n = remaining.len().max(1) as f64;
        return remaining.iter().map(|_| 1.0 / n).collect();
    }
    remaining
        .iter()
        .map(|p| p + removed * (p / total_remaining))
        .collect()
}
