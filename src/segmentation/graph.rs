//! s-t min-cut over a pixel graph, solved with Dinic's max-flow.

use std::collections::VecDeque;

const RESIDUAL_EPSILON: f64 = 1e-9;
const UNREACHED: usize = usize::MAX;

/// Flow network with `n` pixel nodes plus a source and a sink terminal.
///
/// Edges are stored in pairs: edge `e` and its reverse `e ^ 1`.
pub struct FlowGraph {
    adjacency: Vec<Vec<usize>>,
    to: Vec<usize>,
    capacity: Vec<f64>,
    source: usize,
    sink: usize,
}

impl FlowGraph {
    pub fn new(nodes: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); nodes + 2],
            to: Vec::new(),
            capacity: Vec::new(),
            source: nodes,
            sink: nodes + 1,
        }
    }

    fn push_edge(&mut self, from: usize, to: usize, forward: f64, backward: f64) {
        let e = self.to.len();
        self.to.push(to);
        self.capacity.push(forward);
        self.adjacency[from].push(e);
        self.to.push(from);
        self.capacity.push(backward);
        self.adjacency[to].push(e + 1);
    }

    /// Undirected neighbour link between two pixel nodes.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        self.push_edge(a, b, weight, weight);
    }

    /// Terminal links of a pixel node.
    ///
    /// Only the difference of the two weights is stored; the common part is
    /// cut either way and does not change which side the node ends up on.
    pub fn add_terminal_weights(&mut self, node: usize, from_source: f64, to_sink: f64) {
        let delta = from_source - to_sink;
        if delta > 0.0 {
            self.push_edge(self.source, node, delta, 0.0);
        } else if delta < 0.0 {
            self.push_edge(node, self.sink, -delta, 0.0);
        }
    }

    fn levels(&self) -> Option<Vec<usize>> {
        let mut level = vec![UNREACHED; self.adjacency.len()];
        let mut queue = VecDeque::new();
        level[self.source] = 0;
        queue.push_back(self.source);
        while let Some(v) = queue.pop_front() {
            for &e in &self.adjacency[v] {
                let u = self.to[e];
                if self.capacity[e] > RESIDUAL_EPSILON && level[u] == UNREACHED {
                    level[u] = level[v] + 1;
                    queue.push_back(u);
                }
            }
        }
        (level[self.sink] != UNREACHED).then_some(level)
    }

    fn blocking_flow(&mut self, mut level: Vec<usize>) -> f64 {
        let mut next = vec![0usize; self.adjacency.len()];
        let mut path: Vec<usize> = Vec::new();
        let mut total = 0.0;
        let mut v = self.source;

        loop {
            if v == self.sink {
                let bottleneck = path
                    .iter()
                    .map(|&e| self.capacity[e])
                    .fold(f64::INFINITY, f64::min);
                for &e in &path {
                    self.capacity[e] -= bottleneck;
                    self.capacity[e ^ 1] += bottleneck;
                }
                total += bottleneck;
                path.clear();
                v = self.source;
                continue;
            }

            let mut advanced = false;
            while let Some(&e) = self.adjacency[v].get(next[v]) {
                let u = self.to[e];
                if self.capacity[e] > RESIDUAL_EPSILON
                    && level[u] != UNREACHED
                    && level[u] == level[v] + 1
                {
                    path.push(e);
                    v = u;
                    advanced = true;
                    break;
                }
                next[v] += 1;
            }

            if !advanced {
                if v == self.source {
                    break;
                }
                // dead end, retreat one edge
                level[v] = UNREACHED;
                let Some(e) = path.pop() else { break };
                v = self.to[e ^ 1];
                next[v] += 1;
            }
        }
        total
    }

    /// Saturate the network and return the total flow.
    pub fn max_flow(&mut self) -> f64 {
        let _span = tracing::debug_span!("max_flow").entered();
        let mut flow = 0.0;
        while let Some(level) = self.levels() {
            let pushed = self.blocking_flow(level);
            if pushed <= 0.0 {
                break;
            }
            flow += pushed;
        }
        flow
    }

    /// Pixel nodes still reachable from the source in the residual network.
    ///
    /// Call after [`max_flow`](Self::max_flow).
    pub fn source_side(&self) -> Vec<bool> {
        let mut seen = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::new();
        seen[self.source] = true;
        queue.push_back(self.source);
        while let Some(v) = queue.pop_front() {
            for &e in &self.adjacency[v] {
                let u = self.to[e];
                if self.capacity[e] > RESIDUAL_EPSILON && !seen[u] {
                    seen[u] = true;
                    queue.push_back(u);
                }
            }
        }
        seen.truncate(self.source);
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_node_cut_follows_terminal_weights() {
        let mut graph = FlowGraph::new(2);
        graph.add_terminal_weights(0, 10.0, 0.0);
        graph.add_terminal_weights(1, 0.0, 10.0);
        graph.add_edge(0, 1, 1.0);

        let flow = graph.max_flow();
        assert!((flow - 1.0).abs() < 1e-9);
        assert_eq!(graph.source_side(), vec![true, false]);
    }

    #[test]
    fn strong_links_pull_weak_nodes_along() {
        // chain 0 - 1 - 2 with only the ends anchored
        let mut graph = FlowGraph::new(3);
        graph.add_terminal_weights(0, 5.0, 0.0);
        graph.add_terminal_weights(1, 0.0, 0.5);
        graph.add_terminal_weights(2, 0.0, 5.0);
        graph.add_edge(0, 1, 4.0);
        graph.add_edge(1, 2, 1.0);

        let flow = graph.max_flow();
        assert!((flow - 1.5).abs() < 1e-9);
        assert_eq!(graph.source_side(), vec![true, true, false]);
    }

    #[test]
    fn equal_terminal_weights_add_no_edges() {
        let mut graph = FlowGraph::new(1);
        graph.add_terminal_weights(0, 3.0, 3.0);
        assert_eq!(graph.max_flow(), 0.0);
        assert_eq!(graph.source_side(), vec![false]);
    }

    #[test]
    fn long_paths_do_not_recurse() {
        let n = 20_000;
        let mut graph = FlowGraph::new(n);
        graph.add_terminal_weights(0, 2.0, 0.0);
        graph.add_terminal_weights(n - 1, 0.0, 2.0);
        for i in 0..n - 1 {
            graph.add_edge(i, i + 1, 1.0);
        }
        assert!((graph.max_flow() - 1.0).abs() < 1e-9);
        let side = graph.source_side();
        assert!(side[0]);
        assert!(!side[n - 1]);
    }
}
