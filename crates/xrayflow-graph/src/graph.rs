use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use crate::error::GraphError;

/// Directed graph with metadata on its edges.
///
/// Vertices are plain keys; whatever the key stands for lives elsewhere.
/// Iteration follows insertion order so that anything derived from the graph
/// (sort order, traversal order, listings) is deterministic.
///
/// The edge relation is kept acyclic: [`DirectedGraph::connect`] refuses any
/// edge that would close a cycle and leaves the graph untouched.
#[derive(Debug, Clone)]
pub struct DirectedGraph<K, E = ()> {
  /// Vertices in insertion order.
  order: Vec<K>,
  /// Adjacency list: vertex -> downstream vertices.
  outgoing: HashMap<K, Vec<K>>,
  /// Reverse adjacency: vertex -> upstream vertices.
  incoming: HashMap<K, Vec<K>>,
  /// Edge metadata keyed by (from, to).
  edges: HashMap<(K, K), E>,
  /// Edges in insertion order.
  edge_order: Vec<(K, K)>,
}

impl<K, E> Default for DirectedGraph<K, E> {
  fn default() -> Self {
    Self {
      order: Vec::new(),
      outgoing: HashMap::new(),
      incoming: HashMap::new(),
      edges: HashMap::new(),
      edge_order: Vec::new(),
    }
  }
}

impl<K, E> DirectedGraph<K, E>
where
  K: Clone + Eq + Hash + Display,
{
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of vertices.
  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  /// Add a vertex. Returns `false` if it was already present.
  pub fn add_vertex(&mut self, vertex: K) -> bool {
    if self.outgoing.contains_key(&vertex) {
      return false;
    }
    self.outgoing.insert(vertex.clone(), Vec::new());
    self.incoming.insert(vertex.clone(), Vec::new());
    self.order.push(vertex);
    true
  }

  pub fn contains(&self, vertex: &K) -> bool {
    self.outgoing.contains_key(vertex)
  }

  /// Add the edge `from -> to`, meaning `to` depends on `from`.
  ///
  /// Connecting an existing edge again is accepted when the metadata is
  /// equal and rejected otherwise.
  pub fn connect(&mut self, from: K, to: K, meta: E) -> Result<(), GraphError>
  where
    E: PartialEq,
  {
    if !self.contains(&from) {
      return Err(GraphError::vertex_not_found(&from));
    }
    if !self.contains(&to) {
      return Err(GraphError::vertex_not_found(&to));
    }

    if let Some(existing) = self.edges.get(&(from.clone(), to.clone())) {
      if *existing == meta {
        return Ok(());
      }
      return Err(GraphError::ConflictingEdge {
        from: from.to_string(),
        to: to.to_string(),
      });
    }

    // A path to -> from plus the new edge would close a cycle.
    if self.has_path(&to, &from) {
      return Err(GraphError::cycle(&from, &to));
    }

    self
      .outgoing
      .entry(from.clone())
      .or_default()
      .push(to.clone());
    self
      .incoming
      .entry(to.clone())
      .or_default()
      .push(from.clone());
    self.edges.insert((from.clone(), to.clone()), meta);
    self.edge_order.push((from, to));
    Ok(())
  }

  /// Vertices in insertion order.
  pub fn vertices(&self) -> &[K] {
    &self.order
  }

  /// Edges in insertion order as `(from, to, metadata)`.
  pub fn edges(&self) -> impl Iterator<Item = (&K, &K, &E)> {
    self
      .edge_order
      .iter()
      .filter_map(|key| self.edges.get(key).map(|meta| (&key.0, &key.1, meta)))
  }

  /// Metadata of the edge `from -> to`, if present.
  pub fn edge(&self, from: &K, to: &K) -> Option<&E> {
    self.edges.get(&(from.clone(), to.clone()))
  }

  /// Upstream vertices of `vertex`.
  pub fn predecessors(&self, vertex: &K) -> &[K] {
    self
      .incoming
      .get(vertex)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Downstream vertices of `vertex`.
  pub fn successors(&self, vertex: &K) -> &[K] {
    self
      .outgoing
      .get(vertex)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Incoming edges of `vertex` with their metadata.
  pub fn incoming(&self, vertex: &K) -> Vec<(&K, &E)> {
    self
      .predecessors(vertex)
      .iter()
      .filter_map(|from| self.edge(from, vertex).map(|meta| (from, meta)))
      .collect()
  }

  /// Vertices without incoming edges.
  pub fn roots(&self) -> Vec<&K> {
    self
      .order
      .iter()
      .filter(|v| self.predecessors(v).is_empty())
      .collect()
  }

  /// Vertices without outgoing edges.
  pub fn leaves(&self) -> Vec<&K> {
    self
      .order
      .iter()
      .filter(|v| self.successors(v).is_empty())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chain() -> DirectedGraph<&'static str, bool> {
    let mut graph = DirectedGraph::new();
    graph.add_vertex("a");
    graph.add_vertex("b");
    graph.add_vertex("c");
    graph.connect("a", "b", false).unwrap();
    graph.connect("b", "c", true).unwrap();
    graph
  }

  #[test]
  fn test_add_vertex_is_idempotent() {
    let mut graph: DirectedGraph<&str> = DirectedGraph::new();
    assert!(graph.add_vertex("a"));
    assert!(!graph.add_vertex("a"));
    assert_eq!(graph.vertices(), &["a"]);
  }

  #[test]
  fn test_predecessors_and_successors() {
    let graph = chain();
    assert_eq!(graph.successors(&"a"), &["b"]);
    assert_eq!(graph.predecessors(&"c"), &["b"]);
    assert!(graph.predecessors(&"a").is_empty());
    assert_eq!(graph.roots(), vec![&"a"]);
    assert_eq!(graph.leaves(), vec![&"c"]);
  }

  #[test]
  fn test_edge_metadata() {
    let graph = chain();
    assert_eq!(graph.edge(&"b", &"c"), Some(&true));
    assert_eq!(graph.edge(&"c", &"b"), None);
    assert_eq!(graph.incoming(&"c"), vec![(&"b", &true)]);

    let edges: Vec<_> = graph.edges().collect();
    assert_eq!(edges, vec![(&"a", &"b", &false), (&"b", &"c", &true)]);
  }

  #[test]
  fn test_connect_unknown_vertex() {
    let mut graph = chain();
    let err = graph.connect("a", "x", false).unwrap_err();
    assert_eq!(err, GraphError::VertexNotFound("x".to_string()));
  }

  #[test]
  fn test_cycle_is_rejected_and_graph_unchanged() {
    let mut graph = chain();
    let err = graph.connect("c", "a", false).unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected { .. }));
    assert!(graph.successors(&"c").is_empty());
    assert_eq!(graph.edges().count(), 2);
  }

  #[test]
  fn test_self_loop_is_rejected() {
    let mut graph = chain();
    assert!(matches!(
      graph.connect("b", "b", false),
      Err(GraphError::CycleDetected { .. })
    ));
  }

  #[test]
  fn test_reconnect_same_options() {
    let mut graph = chain();
    graph.connect("a", "b", false).unwrap();
    assert_eq!(graph.successors(&"a"), &["b"]);
    assert!(matches!(
      graph.connect("a", "b", true),
      Err(GraphError::ConflictingEdge { .. })
    ));
  }
}
