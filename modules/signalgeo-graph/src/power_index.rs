//! Power index: centrality-based influence score per graph node.
//!
//! score = in_degree·w_in + out_degree·w_out + betweenness·w_b + closeness·w_c
//!
//! Betweenness uses Brandes' algorithm over unweighted directed shortest
//! paths, normalized by `1 / ((n-1)(n-2))`. Closeness uses incoming distances
//! with the Wasserman–Faust correction for graphs that are not strongly
//! connected. Scores are only comparable within one graph.

use std::collections::{BTreeMap, VecDeque};

use tracing::info;

use signalgeo_common::{round4, PowerWeights};

use crate::graph::InfluenceGraph;

/// Compute the power index of every node, isolated nodes included.
pub fn compute_power_index(graph: &InfluenceGraph, weights: &PowerWeights) -> BTreeMap<String, f64> {
    let successors = graph.successor_lists();
    let predecessors = graph.predecessor_lists();
    let betweenness = betweenness_centrality(&successors);
    let closeness = closeness_centrality(&predecessors);

    let scores: BTreeMap<String, f64> = graph
        .nodes()
        .enumerate()
        .map(|(i, node)| {
            let score = predecessors[i].len() as f64 * weights.in_degree
                + successors[i].len() as f64 * weights.out_degree
                + betweenness[i] * weights.betweenness
                + closeness[i] * weights.closeness;
            (node.id.clone(), round4(score))
        })
        .collect();

    let top = rank_power(&scores).into_iter().next();
    info!(nodes = scores.len(), top = ?top, "Power index computed");
    scores
}

/// Nodes by descending score, ties broken by id.
pub fn rank_power(scores: &BTreeMap<String, f64>) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = scores.iter().map(|(k, v)| (k.clone(), *v)).collect();
    // BTreeMap iteration is already id-ordered; a stable sort keeps that for ties.
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

/// Brandes betweenness over adjacency lists (`successors[v]` = out-neighbors).
pub(crate) fn betweenness_centrality(successors: &[Vec<usize>]) -> Vec<f64> {
    let n = successors.len();
    let mut bc = vec![0.0_f64; n];

    for s in 0..n {
        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist = vec![-1_i64; n];
        let mut delta = vec![0.0_f64; n];

        sigma[s] = 1.0;
        dist[s] = 0;
        let mut queue = VecDeque::from([s]);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &successors[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
            }
            if w != s {
                bc[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        for b in &mut bc {
            *b *= scale;
        }
    }
    bc
}

/// Closeness from incoming shortest paths (`predecessors[v]` = in-neighbors):
/// `(r / total) · (r / (n-1))` where `r` nodes can reach `v` at summed
/// distance `total`. Zero when nothing reaches `v`.
pub(crate) fn closeness_centrality(predecessors: &[Vec<usize>]) -> Vec<f64> {
    let n = predecessors.len();
    let mut result = vec![0.0_f64; n];
    if n < 2 {
        return result;
    }

    for (target, slot) in result.iter_mut().enumerate() {
        let mut dist = vec![-1_i64; n];
        dist[target] = 0;
        let mut queue = VecDeque::from([target]);
        let mut total = 0_i64;
        let mut reached = 0_usize;

        while let Some(v) = queue.pop_front() {
            for &u in &predecessors[v] {
                if dist[u] < 0 {
                    dist[u] = dist[v] + 1;
                    total += dist[u];
                    reached += 1;
                    queue.push_back(u);
                }
            }
        }

        if total > 0 {
            let r = reached as f64;
            *slot = (r / total as f64) * (r / (n - 1) as f64);
        }
    }
    result
}
