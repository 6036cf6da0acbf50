//! Minimal reorder planning.
//!
//! Items that lie on a longest increasing subsequence of target positions are
//! already in the right relative order and stay put. Every other item is
//! placed right after its target predecessor, walking the target order, so
//! each placement refers to an item that is already final. The number of
//! moves is `n - LIS`, the minimum for single-item "before/after" moves.

use std::collections::HashMap;

use crate::domain::{ItemId, Move, Placement};

/// Moves that turn `current` into `target`.
///
/// `target` must be a permutation of `current`; items missing from `target`
/// are left where they are.
pub fn plan_moves(current: &[ItemId], target: &[ItemId]) -> Vec<Move> {
    let rank: HashMap<&ItemId, usize> = target.iter().enumerate().map(|(i, id)| (id, i)).collect();
    let ranks: Vec<usize> = current.iter().filter_map(|id| rank.get(id).copied()).collect();

    let mut anchored = vec![false; target.len()];
    for r in longest_increasing(&ranks) {
        anchored[r] = true;
    }

    let Some(first_anchor) = anchored.iter().position(|a| *a) else {
        return Vec::new();
    };

    target
        .iter()
        .enumerate()
        .filter(|(k, _)| !anchored[*k])
        .map(|(k, id)| Move {
            item: id.clone(),
            placement: if k == 0 {
                Placement::Before(target[first_anchor].clone())
            } else {
                Placement::After(target[k - 1].clone())
            },
        })
        .collect()
}

/// Values of one longest strictly increasing subsequence (patience sorting).
fn longest_increasing(values: &[usize]) -> Vec<usize> {
    // tails[len] = index into `values` of the smallest tail of an increasing run of length len+1
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; values.len()];

    for (i, &v) in values.iter().enumerate() {
        let pos = tails.partition_point(|&t| values[t] < v);
        if pos > 0 {
            prev[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut out = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        out.push(values[i]);
        cursor = prev[i];
    }
    out.reverse();
    out
}
