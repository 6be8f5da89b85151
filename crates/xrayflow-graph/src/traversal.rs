//! Traversal algorithms over [`DirectedGraph`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Display;
use std::hash::Hash;

use crate::error::GraphError;
use crate::graph::DirectedGraph;

impl<K, E> DirectedGraph<K, E>
where
  K: Clone + Eq + Hash + Display,
{
  /// Whether `to` can be reached from `from` by following edges.
  ///
  /// Every vertex reaches itself.
  pub fn has_path(&self, from: &K, to: &K) -> bool {
    if from == to {
      return true;
    }
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([from]);
    while let Some(vertex) = queue.pop_front() {
      for next in self.successors(vertex) {
        if next == to {
          return true;
        }
        if visited.insert(next) {
          queue.push_back(next);
        }
      }
    }
    false
  }

  /// Pre-order depth-first traversal starting at `start`.
  ///
  /// Successors are visited in the order their edges were added.
  pub fn depth_first(&self, start: &K) -> Vec<&K> {
    let mut visited = HashSet::new();
    let mut result = Vec::new();
    let Some(start) = self.vertices().iter().find(|v| *v == start) else {
      return result;
    };
    let mut stack = vec![start];
    while let Some(vertex) = stack.pop() {
      if !visited.insert(vertex) {
        continue;
      }
      result.push(vertex);
      // Reverse so the first successor is popped first.
      for next in self.successors(vertex).iter().rev() {
        if !visited.contains(next) {
          stack.push(next);
        }
      }
    }
    result
  }

  /// Order the vertices so that every edge points forward (Kahn's algorithm).
  ///
  /// Ties are broken by insertion order.
  pub fn topological_sort(&self) -> Result<Vec<&K>, GraphError> {
    let mut in_degrees: HashMap<&K, usize> = self
      .vertices()
      .iter()
      .map(|v| (v, self.predecessors(v).len()))
      .collect();

    let mut queue: VecDeque<&K> = self
      .vertices()
      .iter()
      .filter(|v| in_degrees.get(v) == Some(&0))
      .collect();

    let mut sorted = Vec::with_capacity(self.len());
    while let Some(vertex) = queue.pop_front() {
      sorted.push(vertex);
      for next in self.successors(vertex) {
        if let Some(degree) = in_degrees.get_mut(next) {
          *degree -= 1;
          if *degree == 0 {
            queue.push_back(next);
          }
        }
      }
    }

    if sorted.len() != self.len() {
      // connect() never admits a cycle, so this only guards against misuse.
      let stuck = self
        .vertices()
        .iter()
        .find(|v| in_degrees.get(v).is_some_and(|d| *d > 0))
        .map(|v| v.to_string())
        .unwrap_or_default();
      return Err(GraphError::CycleDetected {
        from: stuck.clone(),
        to: stuck,
      });
    }

    Ok(sorted)
  }
}
