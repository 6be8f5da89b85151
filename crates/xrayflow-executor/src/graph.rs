//! Vertex and edge registry of an [`ExecutableGraph`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;
use xrayflow_command::{Command, CommandBody, CommandId, Executable};
use xrayflow_graph::{DirectedGraph, GraphError};

/// Metadata carried by a dependency edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeOptions {
  /// An optional edge orders execution but never skips its destination.
  pub optional: bool,
  /// Which input of the destination this edge feeds.
  pub slot: Option<String>,
}

impl EdgeOptions {
  pub fn required() -> Self {
    Self::default()
  }

  pub fn optional() -> Self {
    Self {
      optional: true,
      slot: None,
    }
  }

  pub fn slot(mut self, slot: impl Into<String>) -> Self {
    self.slot = Some(slot.into());
    self
  }
}

/// A dependency edge as returned by [`ExecutableGraph::edges`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
  pub from: CommandId,
  pub to: CommandId,
  pub options: EdgeOptions,
}

/// Anything that names a vertex: its id, or the command itself.
pub trait VertexRef {
  fn vertex_id(&self) -> CommandId;
}

impl VertexRef for CommandId {
  fn vertex_id(&self) -> CommandId {
    *self
  }
}

impl<B: CommandBody> VertexRef for Command<B> {
  fn vertex_id(&self) -> CommandId {
    self.id()
  }
}

impl<T: Executable + ?Sized> VertexRef for Arc<T> {
  fn vertex_id(&self) -> CommandId {
    self.as_ref().id()
  }
}

impl<T: VertexRef + ?Sized> VertexRef for &T {
  fn vertex_id(&self) -> CommandId {
    (**self).vertex_id()
  }
}

pub(crate) struct Registry<V: ?Sized> {
  pub(crate) graph: DirectedGraph<CommandId, EdgeOptions>,
  pub(crate) vertices: HashMap<CommandId, Arc<V>>,
}

impl<V: Executable + ?Sized> Registry<V> {
  /// The existing registration of `vertex`, if it was placed before.
  fn existing(&self, vertex: &Arc<V>) -> Result<Option<Arc<V>>, GraphError> {
    match self.vertices.get(&vertex.id()) {
      None => Ok(None),
      Some(existing) if std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(vertex)) => {
        Ok(Some(Arc::clone(existing)))
      }
      Some(_) => Err(GraphError::DuplicateVertex(vertex.name().to_string())),
    }
  }
}

impl<V: ?Sized> Registry<V> {
  fn resolve(&self, ids: &[CommandId]) -> Vec<Arc<V>> {
    ids
      .iter()
      .filter_map(|id| self.vertices.get(id).cloned())
      .collect()
  }
}

/// A dependency graph of commands and the scheduler that runs it.
///
/// An edge `from -> to` means `to` reads `from`'s output. Required edges skip
/// the destination when the source does not succeed; optional edges only
/// order execution.
///
/// All methods take `&self`: the graph can keep being wired while an
/// [`execute`](ExecutableGraph::execute) pass is running, and the pass picks
/// up new vertices and edges until it has produced its result. Vertices added
/// during a pass should go through [`place_with`](ExecutableGraph::place_with)
/// so they arrive together with their dependencies.
pub struct ExecutableGraph<V: ?Sized = dyn Executable> {
  registry: Mutex<Registry<V>>,
  changed: Notify,
}

impl ExecutableGraph {
  /// Create an empty graph of type-erased commands.
  pub fn new() -> Self {
    Self::default()
  }
}

impl<V: ?Sized> Default for ExecutableGraph<V> {
  fn default() -> Self {
    Self {
      registry: Mutex::new(Registry {
        graph: DirectedGraph::new(),
        vertices: HashMap::new(),
      }),
      changed: Notify::new(),
    }
  }
}

impl<V: Executable + ?Sized> ExecutableGraph<V> {
  /// Register a vertex.
  ///
  /// Placing the same vertex again returns the existing registration. A
  /// different vertex with the same id is rejected.
  ///
  /// A running pass may launch the vertex as soon as it is placed, before
  /// any later [`connect`](Self::connect) reaches it.
  pub fn place(&self, vertex: Arc<V>) -> Result<Arc<V>, GraphError> {
    let id = vertex.id();
    {
      let mut registry = self.lock();
      if let Some(existing) = registry.existing(&vertex)? {
        return Ok(existing);
      }
      registry.graph.add_vertex(id);
      registry.vertices.insert(id, Arc::clone(&vertex));
    }
    self.changed.notify_one();
    Ok(vertex)
  }

  /// Register a vertex together with the vertices it depends on.
  ///
  /// The vertex and its incoming edges become visible to a running pass in
  /// one step, so it is never launched ahead of its dependencies. Every
  /// dependency must already be placed. On error nothing is registered.
  pub fn place_with<R: VertexRef>(
    &self,
    vertex: Arc<V>,
    dependencies: impl IntoIterator<Item = (R, EdgeOptions)>,
  ) -> Result<Arc<V>, GraphError> {
    let id = vertex.id();
    let vertex = {
      let mut registry = self.lock();
      let vertex = registry.existing(&vertex)?.unwrap_or(vertex);

      let mut graph = registry.graph.clone();
      graph.add_vertex(id);
      for (from, options) in dependencies {
        graph.connect(from.vertex_id(), id, options)?;
      }

      registry.graph = graph;
      registry.vertices.insert(id, Arc::clone(&vertex));
      vertex
    };
    self.changed.notify_one();
    Ok(vertex)
  }

  /// Register the dependency `from -> to`.
  ///
  /// Both vertices must have been placed. An edge that would close a cycle
  /// is rejected and leaves the graph unchanged.
  pub fn connect(
    &self,
    from: impl VertexRef,
    to: impl VertexRef,
    options: EdgeOptions,
  ) -> Result<(), GraphError> {
    self
      .lock()
      .graph
      .connect(from.vertex_id(), to.vertex_id(), options)?;
    self.changed.notify_one();
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.lock().graph.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().graph.is_empty()
  }

  pub fn contains(&self, vertex: impl VertexRef) -> bool {
    self.lock().graph.contains(&vertex.vertex_id())
  }

  pub fn get(&self, vertex: impl VertexRef) -> Option<Arc<V>> {
    self.lock().vertices.get(&vertex.vertex_id()).cloned()
  }

  /// Vertices in placement order.
  pub fn vertices(&self) -> Vec<Arc<V>> {
    let registry = self.lock();
    registry.resolve(registry.graph.vertices())
  }

  /// Edges in the order they were connected.
  pub fn edges(&self) -> Vec<Edge> {
    self
      .lock()
      .graph
      .edges()
      .map(|(from, to, options)| Edge {
        from: *from,
        to: *to,
        options: options.clone(),
      })
      .collect()
  }

  /// Vertices `vertex` depends on.
  pub fn predecessors(&self, vertex: impl VertexRef) -> Vec<Arc<V>> {
    let registry = self.lock();
    registry.resolve(registry.graph.predecessors(&vertex.vertex_id()))
  }

  /// Vertices that depend on `vertex`.
  pub fn successors(&self, vertex: impl VertexRef) -> Vec<Arc<V>> {
    let registry = self.lock();
    registry.resolve(registry.graph.successors(&vertex.vertex_id()))
  }

  /// A valid sequential execution order.
  pub fn execution_order(&self) -> Result<Vec<Arc<V>>, GraphError> {
    let registry = self.lock();
    let order: Vec<CommandId> = registry
      .graph
      .topological_sort()?
      .into_iter()
      .copied()
      .collect();
    Ok(registry.resolve(&order))
  }

  pub(crate) fn lock(&self) -> MutexGuard<'_, Registry<V>> {
    self.registry.lock().unwrap_or_else(|e| e.into_inner())
  }

  pub(crate) fn changed(&self) -> &Notify {
    &self.changed
  }
}

impl<V: Executable + ?Sized> fmt::Debug for ExecutableGraph<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let registry = self.lock();
    f.debug_struct("ExecutableGraph")
      .field("vertices", &registry.graph.len())
      .field("edges", &registry.graph.edges().count())
      .finish()
  }
}
