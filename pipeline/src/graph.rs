//! Box dependency graph.
//!
//! Box A precedes box B when an output port of A writes a variable an input
//! port of B reads. Boxes are emitted in a topological order of that graph;
//! among boxes that are ready at the same time the authored order wins.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use crate::error::PipelineError;
use crate::pipeline::Pipeline;

pub struct DependencyGraph {
    names: Vec<String>,
    successors: Vec<BTreeSet<usize>>,
}

impl DependencyGraph {
    pub fn build(pipeline: &Pipeline) -> Self {
        let mut successors = vec![BTreeSet::new(); pipeline.boxes.len()];
        let readers = pipeline.readers();
        for (variable, writers) in pipeline.writers() {
            let Some(readers) = readers.get(variable) else {
                continue;
            };
            for writer in &writers {
                for reader in readers {
                    successors[writer.box_index].insert(reader.box_index);
                }
            }
        }
        DependencyGraph {
            names: pipeline.boxes.iter().map(|b| b.name.clone()).collect(),
            successors,
        }
    }

    pub fn successors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.successors[node].iter().copied()
    }

    /// Box indices in dependency order, ties broken by authored position.
    pub fn topological_order(&self) -> Result<Vec<usize>, PipelineError> {
        let mut in_degree = vec![0usize; self.names.len()];
        for edges in &self.successors {
            for &next in edges {
                in_degree[next] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();
        let mut order = Vec::with_capacity(self.names.len());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for next in self.successors(node) {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() == self.names.len() {
            return Ok(order);
        }
        let blocked: BTreeSet<usize> = (0..self.names.len())
            .filter(|n| in_degree[*n] > 0)
            .collect();
        Err(PipelineError::CyclicDependency {
            boxes: self.find_cycle(&blocked),
        })
    }

    /// Names of the boxes on one cycle among `candidates`, the first box
    /// repeated at the end.
    fn find_cycle(&self, candidates: &BTreeSet<usize>) -> Vec<String> {
        let mut visiting = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut path = Vec::new();
        for &start in candidates {
            if let Some(cycle) =
                self.cycle_dfs(start, candidates, &mut visiting, &mut visited, &mut path)
            {
                let mut names: Vec<String> =
                    cycle.iter().map(|&n| self.names[n].clone()).collect();
                names.push(self.names[cycle[0]].clone());
                return names;
            }
        }
        candidates.iter().map(|&n| self.names[n].clone()).collect()
    }

    fn cycle_dfs(
        &self,
        node: usize,
        candidates: &BTreeSet<usize>,
        visiting: &mut BTreeSet<usize>,
        visited: &mut BTreeSet<usize>,
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        if visiting.contains(&node) {
            let start = path.iter().position(|&n| n == node)?;
            return Some(path[start..].to_vec());
        }
        if !visited.insert(node) {
            return None;
        }
        visiting.insert(node);
        path.push(node);
        for next in self.successors(node).filter(|n| candidates.contains(n)) {
            if let Some(cycle) = self.cycle_dfs(next, candidates, visiting, visited, path) {
                return Some(cycle);
            }
        }
        path.pop();
        visiting.remove(&node);
        None
    }
}
