//! Multinomial No-U-Turn trajectory building.
//!
//! The trajectory is doubled in a random direction until it makes a U-turn,
//! the energy error explodes, or the maximum depth is reached. Turning uses
//! the generalized criterion on the summed momentum `rho` of a span: the span
//! turns once either endpoint velocity has a non-positive projection on
//! `rho`. Every merge checks the combined span and both spans that reach one
//! point into the neighbouring subtree. Within a subtree the proposal is chosen by uniform progressive
//! sampling; at the top level biased progressive sampling favours the newer
//! half. A divergent transition is rejected and the chain stays put.

use rand::Rng;

use super::hamiltonian::{leapfrog, sample_momentum, PhasePoint};
use crate::constants::DIVERGENCE_THRESHOLD;
use crate::math;
use crate::model::LogDensity;
use crate::result::DrawStats;
use crate::types::Position;

/// Outcome of one NUTS transition.
pub(crate) struct Transition {
    pub point: PhasePoint,
    pub stats: DrawStats,
}

/// Fixed inputs shared by every node of one trajectory.
struct Trajectory<'a, M: ?Sized> {
    model: &'a M,
    inv_mass: &'a Position,
    h0: f64,
}

/// A built (sub)tree: its endpoints, its multinomial sample and bookkeeping.
///
/// `left` and `right` are in position order regardless of build direction.
struct Tree {
    left: PhasePoint,
    right: PhasePoint,
    proposal: PhasePoint,
    /// Sum of momenta over every point of the span.
    rho: Position,
    log_sum_weight: f64,
    n_leapfrog: usize,
    sum_accept_prob: f64,
    divergent: bool,
    turning: bool,
}

impl Tree {
    fn singleton(point: PhasePoint) -> Self {
        Self {
            rho: point.p.clone(),
            left: point.clone(),
            right: point.clone(),
            proposal: point,
            log_sum_weight: 0.0,
            n_leapfrog: 0,
            sum_accept_prob: 0.0,
            divergent: false,
            turning: false,
        }
    }

    /// Extend this tree by `other`, which was built outward in the given direction.
    fn attach(&mut self, other: Tree, forward: bool) {
        self.rho += &other.rho;
        self.n_leapfrog += other.n_leapfrog;
        self.sum_accept_prob += other.sum_accept_prob;
        self.log_sum_weight = math::log_sum_exp(self.log_sum_weight, other.log_sum_weight);
        if forward {
            self.right = other.right;
        } else {
            self.left = other.left;
        }
    }
}

/// No-U-turn check for the span with endpoints `start`, `end` and momentum sum `rho`.
fn span_turning(start: &PhasePoint, end: &PhasePoint, rho: &Position, inv_mass: &Position) -> bool {
    start.velocity(inv_mass).dot(rho) <= 0.0 || end.velocity(inv_mass).dot(rho) <= 0.0
}

/// Whether joining adjacent trees `left` and `right` produces a U-turn.
fn merge_turning(left: &Tree, right: &Tree, inv_mass: &Position) -> bool {
    let rho = &left.rho + &right.rho;
    if span_turning(&left.left, &right.right, &rho, inv_mass) {
        return true;
    }
    let left_extended = &left.rho + &right.left.p;
    if span_turning(&left.left, &right.left, &left_extended, inv_mass) {
        return true;
    }
    let right_extended = &right.rho + &left.right.p;
    span_turning(&left.right, &right.right, &right_extended, inv_mass)
}

/// `(left, right)` in position order for a tree extended in the given direction.
fn ordered<'t>(near: &'t Tree, far: &'t Tree, forward: bool) -> (&'t Tree, &'t Tree) {
    if forward {
        (near, far)
    } else {
        (far, near)
    }
}

impl<M: LogDensity + ?Sized> Trajectory<'_, M> {
    fn leaf(&self, edge: &PhasePoint, eps: f64) -> Tree {
        let next = leapfrog(self.model, edge, eps, self.inv_mass);
        let energy_error = next.hamiltonian(self.inv_mass) - self.h0;

        let divergent = !next.is_finite()
            || !energy_error.is_finite()
            || math::abs(energy_error) > DIVERGENCE_THRESHOLD;

        let (log_weight, accept_prob) = if divergent {
            (f64::NEG_INFINITY, 0.0)
        } else {
            (-energy_error, math::exp(-energy_error).min(1.0))
        };

        Tree {
            rho: next.p.clone(),
            left: next.clone(),
            right: next.clone(),
            proposal: next,
            log_sum_weight: log_weight,
            n_leapfrog: 1,
            sum_accept_prob: accept_prob,
            divergent,
            turning: false,
        }
    }

    /// Build a subtree of `2^depth` leapfrog steps starting past `edge`.
    fn build<R: Rng + ?Sized>(
        &self,
        edge: &PhasePoint,
        depth: usize,
        eps: f64,
        rng: &mut R,
    ) -> Tree {
        if depth == 0 {
            return self.leaf(edge, eps);
        }

        let forward = eps > 0.0;
        let mut inner = self.build(edge, depth - 1, eps, rng);
        if inner.divergent || inner.turning {
            return inner;
        }

        let outer_edge = if forward { &inner.right } else { &inner.left };
        let outer = self.build(outer_edge, depth - 1, eps, rng);
        if outer.divergent || outer.turning {
            inner.n_leapfrog += outer.n_leapfrog;
            inner.sum_accept_prob += outer.sum_accept_prob;
            inner.divergent = outer.divergent;
            inner.turning = outer.turning;
            return inner;
        }

        let (left, right) = ordered(&inner, &outer, forward);
        let turning = merge_turning(left, right, self.inv_mass);

        let combined = math::log_sum_exp(inner.log_sum_weight, outer.log_sum_weight);
        let take_outer = math::exp(outer.log_sum_weight - combined);
        let outer_proposal = outer.proposal.clone();
        inner.attach(outer, forward);
        if rng.random::<f64>() < take_outer {
            inner.proposal = outer_proposal;
        }
        inner.turning = turning;
        inner
    }
}

/// Run one NUTS transition from `current` (its momentum is ignored).
pub(crate) fn transition<M, R>(
    model: &M,
    current: &PhasePoint,
    step_size: f64,
    inv_mass: &Position,
    max_tree_depth: usize,
    rng: &mut R,
) -> Transition
where
    M: LogDensity + ?Sized,
    R: Rng + ?Sized,
{
    let mut start = current.clone();
    start.p = sample_momentum(rng, inv_mass);
    let h0 = start.hamiltonian(inv_mass);

    let trajectory = Trajectory {
        model,
        inv_mass,
        h0,
    };
    let mut tree = Tree::singleton(start);
    let mut depth = 0;

    while depth < max_tree_depth {
        let forward = rng.random::<bool>();
        let (edge, eps) = if forward {
            (&tree.right, step_size)
        } else {
            (&tree.left, -step_size)
        };
        let subtree = trajectory.build(edge, depth, eps, rng);
        depth += 1;

        if subtree.divergent || subtree.turning {
            tree.n_leapfrog += subtree.n_leapfrog;
            tree.sum_accept_prob += subtree.sum_accept_prob;
            tree.divergent = subtree.divergent;
            break;
        }

        let (left, right) = ordered(&tree, &subtree, forward);
        let turning = merge_turning(left, right, inv_mass);

        let take_subtree = math::exp(subtree.log_sum_weight - tree.log_sum_weight).min(1.0);
        let subtree_proposal = subtree.proposal.clone();
        tree.attach(subtree, forward);
        if rng.random::<f64>() < take_subtree {
            tree.proposal = subtree_proposal;
        }

        if turning {
            break;
        }
    }

    let accept_prob = if tree.n_leapfrog == 0 {
        0.0
    } else {
        tree.sum_accept_prob / tree.n_leapfrog as f64
    };

    let point = if tree.divergent {
        current.clone()
    } else {
        tree.proposal
    };

    Transition {
        point,
        stats: DrawStats {
            accept_prob,
            tree_depth: depth,
            n_leapfrog: tree.n_leapfrog,
            divergent: tree.divergent,
            energy: h0,
        },
    }
}
