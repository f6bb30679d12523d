//! Tour constructor.
//!
//! Turns a stop set and its cost matrix into a closed tour
//! depot → stops → depot. Two construction heuristics are available:
//! cheapest-arc insertion and Clarke-Wright savings. Both are pure and
//! deterministic: the same inputs always give the same tour.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::distance::{CostMatrix, MAX_ARC_COST, ScaleFactor};
use crate::error::OptimizationFailure;
use crate::stop_set::StopSet;
use crate::traits::StopId;

/// How often (in processed savings) the merge loop checks its budget.
const BUDGET_CHECK_INTERVAL: usize = 256;

/// Construction heuristic used by [`solve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Strategy {
    /// Greedy cheapest insertion, growing a tour from the depot.
    #[default]
    CheapestArc,
    /// Clarke-Wright savings, merging per-stop round trips.
    Savings,
}

/// Per-trip tour construction settings.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub strategy: Strategy,
    /// Wall-clock budget for the savings merge loop.
    pub savings_budget: Option<Duration>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            savings_budget: Some(Duration::from_secs(10)),
        }
    }
}

impl SolveOptions {
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

/// Visiting order as stop-set indices, starting and ending at the depot (0),
/// together with its scaled cost.
///
/// A depot-only stop set yields the single-point tour `[0]` costing 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Tour {
    order: Vec<usize>,
    cost: i64,
}

impl Tour {
    /// The single-point tour of a trip with nothing to visit.
    pub fn depot_only() -> Self {
        Self {
            order: vec![0],
            cost: 0,
        }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sum of scaled arc costs along the tour.
    pub fn cost(&self) -> i64 {
        self.cost
    }

    /// Tour length restored to the original distance unit.
    pub fn distance(&self, scale: ScaleFactor) -> f64 {
        scale.to_unit(self.cost)
    }

    /// Stop identifiers in visiting order.
    pub fn stops(&self, stop_set: &StopSet) -> Vec<StopId> {
        self.order
            .iter()
            .filter_map(|&index| stop_set.get(index).cloned())
            .collect()
    }
}

/// Solves one trip with default options for `strategy`.
pub fn solve(
    stop_set: &StopSet,
    matrix: &CostMatrix,
    strategy: Strategy,
) -> Result<Tour, OptimizationFailure> {
    solve_with_options(stop_set, matrix, &SolveOptions::with_strategy(strategy))
}

pub fn solve_with_options(
    stop_set: &StopSet,
    matrix: &CostMatrix,
    options: &SolveOptions,
) -> Result<Tour, OptimizationFailure> {
    if matrix.size() != stop_set.len() {
        return Err(OptimizationFailure::SizeMismatch {
            stops: stop_set.len(),
            matrix: matrix.size(),
        });
    }

    if stop_set.len() < 2 {
        return Ok(Tour::depot_only());
    }

    let arcs = Arcs::complete(stop_set, matrix)?;
    let order = match options.strategy {
        Strategy::CheapestArc => cheapest_arc(&arcs),
        Strategy::Savings => savings(&arcs, stop_set, options.savings_budget)?,
    };
    let cost = arcs.path_cost(&order);

    Ok(Tour { order, cost })
}

/// Dense arc costs, verified to have no gaps and to lie in
/// `0..=MAX_ARC_COST`, so insertion deltas and savings cannot overflow.
struct Arcs {
    costs: Vec<i64>,
    size: usize,
    symmetric: bool,
}

impl Arcs {
    fn complete(stop_set: &StopSet, matrix: &CostMatrix) -> Result<Self, OptimizationFailure> {
        let size = matrix.size();
        let mut costs = Vec::with_capacity(size * size);
        for from in 0..size {
            for to in 0..size {
                let (from_id, to_id) = (&stop_set.stops()[from], &stop_set.stops()[to]);
                let cost = matrix.cost(from, to).ok_or_else(|| OptimizationFailure::MissingArc {
                    from: from_id.clone(),
                    to: to_id.clone(),
                })?;
                if !(0..=MAX_ARC_COST).contains(&cost) {
                    return Err(OptimizationFailure::CostOutOfRange {
                        from: from_id.clone(),
                        to: to_id.clone(),
                        cost,
                    });
                }
                costs.push(cost);
            }
        }

        Ok(Self {
            costs,
            size,
            symmetric: matrix.is_symmetric(),
        })
    }

    fn get(&self, from: usize, to: usize) -> i64 {
        self.costs[from * self.size + to]
    }

    fn path_cost(&self, path: &[usize]) -> i64 {
        path.windows(2).map(|arc| self.get(arc[0], arc[1])).sum()
    }
}

// ============================================================================
// Cheapest arc
// ============================================================================

/// Greedy cheapest insertion.
///
/// Starting from the depot alone, repeatedly inserts the pending stop whose
/// best insertion point adds the least tour length. Ties go to the stop
/// (then position) found first in stop-set order.
fn cheapest_arc(arcs: &Arcs) -> Vec<usize> {
    let mut tour = vec![0, 0];
    let mut pending: Vec<usize> = (1..arcs.size).collect();

    while !pending.is_empty() {
        // (added cost, slot in pending, insert after tour position)
        let mut best: Option<(i64, usize, usize)> = None;

        for (slot, &stop) in pending.iter().enumerate() {
            for position in 0..tour.len() - 1 {
                let (before, after) = (tour[position], tour[position + 1]);
                let delta = arcs.get(before, stop) + arcs.get(stop, after) - arcs.get(before, after);
                if best.is_none_or(|(cost, _, _)| delta < cost) {
                    best = Some((delta, slot, position));
                }
            }
        }

        let Some((delta, slot, position)) = best else {
            break;
        };
        let stop = pending.remove(slot);
        tour.insert(position + 1, stop);
        debug!(stop, position = position + 1, delta, "cheapest-arc insertion");
    }

    tour
}

// ============================================================================
// Savings
// ============================================================================

#[derive(Debug)]
struct Saving {
    i: usize,
    j: usize,
    value: i64,
}

/// Clarke-Wright savings.
///
/// Every stop starts on its own depot round trip. Pairs are merged in
/// decreasing order of `d(i, 0) + d(0, j) - d(i, j)` while both stops are
/// route endpoints of different routes. Routes are only reversed when the
/// matrix is symmetric, since reversal would change the cost of an
/// asymmetric route. Routes left unmerged are chained in ascending order of
/// their first stop's identifier.
fn savings(
    arcs: &Arcs,
    stop_set: &StopSet,
    budget: Option<Duration>,
) -> Result<Vec<usize>, OptimizationFailure> {
    let started = Instant::now();
    let n = arcs.size;

    let mut savings = Vec::new();
    for i in 1..n {
        check_budget(started, budget)?;
        for j in 1..n {
            // Symmetric savings are the same both ways round.
            if i == j || (arcs.symmetric && j < i) {
                continue;
            }
            let value = arcs.get(i, 0) + arcs.get(0, j) - arcs.get(i, j);
            if value > 0 {
                savings.push(Saving { i, j, value });
            }
        }
    }

    // Stable: equal savings keep (i, j) enumeration order.
    savings.sort_by(|a, b| b.value.cmp(&a.value));

    let mut route_of: Vec<usize> = (0..n).collect();
    let mut routes: Vec<Vec<usize>> = (0..n)
        .map(|stop| if stop == 0 { Vec::new() } else { vec![stop] })
        .collect();

    for (processed, saving) in savings.iter().enumerate() {
        if processed % BUDGET_CHECK_INTERVAL == 0 {
            check_budget(started, budget)?;
        }

        let (ri, rj) = (route_of[saving.i], route_of[saving.j]);
        if ri == rj {
            continue;
        }

        let i_head = routes[ri].first() == Some(&saving.i);
        let i_tail = routes[ri].last() == Some(&saving.i);
        let j_head = routes[rj].first() == Some(&saving.j);
        let j_tail = routes[rj].last() == Some(&saving.j);

        let mut route_i = std::mem::take(&mut routes[ri]);
        let mut route_j = std::mem::take(&mut routes[rj]);

        let merged = if i_tail && j_head {
            route_i.append(&mut route_j);
            route_i
        } else if arcs.symmetric && i_head && j_tail {
            route_j.append(&mut route_i);
            route_j
        } else if arcs.symmetric && i_tail && j_tail {
            route_j.reverse();
            route_i.append(&mut route_j);
            route_i
        } else if arcs.symmetric && i_head && j_head {
            route_i.reverse();
            route_i.append(&mut route_j);
            route_i
        } else {
            // Interior stop: not a merge point.
            routes[ri] = route_i;
            routes[rj] = route_j;
            continue;
        };

        for &stop in &merged {
            route_of[stop] = ri;
        }
        debug!(i = saving.i, j = saving.j, saving = saving.value, len = merged.len(), "savings merge");
        routes[ri] = merged;
    }

    let mut remaining: Vec<Vec<usize>> = routes.into_iter().filter(|route| !route.is_empty()).collect();
    remaining.sort_by(|a, b| stop_set.stops()[a[0]].cmp(&stop_set.stops()[b[0]]));

    let mut tour = Vec::with_capacity(n + 1);
    tour.push(0);
    tour.extend(remaining.into_iter().flatten());
    tour.push(0);
    Ok(tour)
}

fn check_budget(started: Instant, budget: Option<Duration>) -> Result<(), OptimizationFailure> {
    match budget {
        Some(limit) if started.elapsed() >= limit => Err(OptimizationFailure::BudgetExhausted {
            elapsed: started.elapsed(),
        }),
        _ => Ok(()),
    }
}
