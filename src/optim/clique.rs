//! Clique partitioning of the pairwise-security graph
//!
//! A clique of k locked signals satisfies k(k-1)/2 pairwise-security
//! constraints, so concentrating the key-bit budget in few large cliques
//! beats spreading it. The solver repeatedly extracts one clique from the
//! remaining vertices, capped at the remaining budget.

use crate::analysis::PairwiseGraph;

/// Partition up to `budget` vertices into disjoint cliques
///
/// Cliques are emitted best-first; isolated vertices are appended as
/// singletons, in index order, only while budget remains. With
/// `exhaustive`, each clique is a true maximum clique of the remaining
/// subgraph (branch and bound); the default expands greedily from every
/// seed vertex, which is adequate for the graph sizes at hand. Both
/// variants break ties towards lower vertex indices and are deterministic.
pub fn partition_cliques(g: &PairwiseGraph, budget: usize, exhaustive: bool) -> Vec<Vec<usize>> {
    let mut active = vec![true; g.nb_vertices()];
    let mut cliques = Vec::new();
    let mut used = 0usize;
    loop {
        let limit = budget - used;
        if limit < 2 {
            break;
        }
        let c = if exhaustive {
            best_clique_exact(g, &active, limit)
        } else {
            best_clique_greedy(g, &active, limit)
        };
        if c.len() < 2 {
            break;
        }
        used += c.len();
        for v in &c {
            active[*v] = false;
        }
        cliques.push(c);
    }
    for v in 0..g.nb_vertices() {
        if used == budget {
            break;
        }
        if active[v] {
            active[v] = false;
            used += 1;
            cliques.push(vec![v]);
        }
    }
    cliques
}

/// Number of pairwise-security constraints satisfied by a partition
pub fn partition_value(cliques: &[Vec<usize>]) -> usize {
    cliques.iter().map(|c| c.len() * (c.len() - 1) / 2).sum()
}

/// Grow a clique from each seed vertex, keeping the best
fn best_clique_greedy(g: &PairwiseGraph, active: &[bool], limit: usize) -> Vec<usize> {
    let mut best = Vec::new();
    for seed in 0..g.nb_vertices() {
        if !active[seed] {
            continue;
        }
        let mut r = vec![seed];
        let mut p: Vec<usize> = (0..g.nb_vertices())
            .filter(|v| active[*v] && g.connected(seed, *v))
            .collect();
        while r.len() < limit && !p.is_empty() {
            // Most neighbors left in p, ties to the lower index
            let v = *p
                .iter()
                .max_by_key(|v| {
                    (
                        p.iter().filter(|u| g.connected(**v, **u)).count(),
                        std::cmp::Reverse(**v),
                    )
                })
                .unwrap();
            r.push(v);
            p.retain(|u| *u != v && g.connected(v, *u));
        }
        if r.len() > best.len() {
            r.sort();
            best = r;
            if best.len() == limit {
                break;
            }
        }
    }
    best
}

/// Maximum clique of the active subgraph, truncated at the budget
fn best_clique_exact(g: &PairwiseGraph, active: &[bool], limit: usize) -> Vec<usize> {
    let p: Vec<usize> = (0..g.nb_vertices()).filter(|v| active[*v]).collect();
    let mut best = Vec::new();
    let mut r = Vec::new();
    extend(g, &mut r, &p, limit, &mut best);
    best
}

fn extend(
    g: &PairwiseGraph,
    r: &mut Vec<usize>,
    p: &[usize],
    limit: usize,
    best: &mut Vec<usize>,
) {
    if r.len() > best.len() {
        *best = r.clone();
    }
    if r.len() == limit || r.len() + p.len() <= best.len() {
        return;
    }
    for (i, v) in p.iter().enumerate() {
        let rest: Vec<usize> = p[i + 1..]
            .iter()
            .filter(|u| g.connected(*v, **u))
            .copied()
            .collect();
        r.push(*v);
        extend(g, r, &rest, limit, best);
        r.pop();
    }
}
