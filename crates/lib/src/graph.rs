//! Dependency graph queries.
//!
//! On first query the targets reachable from the queried one are linked (path
//! references looked up) and that subgraph is checked for cycles. Resolved
//! dependency maps and ordinals are then computed together and memoized per
//! target.
//!
//! # Visibility
//!
//! A target's resolved map records each reachable dependency with the
//! visibility under which it was first discovered:
//!
//! 1. direct private dependencies, not expanded further
//! 2. direct public dependencies, plus their own non-private resolved entries
//! 3. direct runtime dependencies, merged the same way as public ones
//!
//! The result is sorted by ordinal, so dependencies precede dependents.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::project::{Entry, Project};
use crate::target::{DependencyRef, ResolvedDependency, Target, TargetId, TargetState, Visibility};

impl Project {
  /// Direct dependencies with path references linked to targets.
  pub fn links(&self, id: TargetId) -> Result<&[ResolvedDependency]> {
    let target = self.target(id)?;
    if let Some(links) = target.links.get() {
      return Ok(links);
    }

    let mut links: Vec<ResolvedDependency> = Vec::with_capacity(target.dependencies().len());
    for dependency in target.dependencies() {
      let linked = match &dependency.reference {
        DependencyRef::Target(dep) => *dep,
        DependencyRef::Path(path) => match self.find(path) {
          Some(Entry::Target(dep)) => dep,
          Some(Entry::Namespace(_)) => {
            return Err(Error::NotATarget {
              target: target.path().to_string(),
              path: path.clone(),
            });
          }
          None => return Err(Error::UnknownTarget(path.clone())),
        },
      };
      if links.iter().any(|l| l.target == linked) {
        return Err(Error::DuplicateDependency {
          target: target.path().to_string(),
          dependency: self.target(linked)?.path().to_string(),
        });
      }
      links.push(ResolvedDependency {
        target: linked,
        visibility: dependency.visibility,
      });
    }

    trace!(target_path = %target.path(), count = links.len(), "linked dependencies");
    Ok(target.links.get_or_init(|| links))
  }

  /// Fail with the offending chain if the graph reachable from `id` has a cycle.
  ///
  /// Only targets reachable from `id` are linked, so an unresolved reference
  /// elsewhere does not affect this query. Verified targets are not walked again.
  pub fn verify_acyclic(&self, id: TargetId) -> Result<()> {
    if self.target(id)?.acyclic.get() {
      return Ok(());
    }

    let mut graph: DiGraph<TargetId, ()> = DiGraph::new();
    let mut nodes: HashMap<TargetId, NodeIndex> = HashMap::from([(id, graph.add_node(id))]);
    let mut pending = vec![id];
    while let Some(current) = pending.pop() {
      if self.target(current)?.acyclic.get() {
        continue;
      }
      for link in self.links(current)? {
        let next = match nodes.get(&link.target) {
          Some(node) => *node,
          None => {
            let node = graph.add_node(link.target);
            nodes.insert(link.target, node);
            pending.push(link.target);
            node
          }
        };
        graph.add_edge(nodes[&current], next, ());
      }
    }

    if let Err(cycle) = toposort(&graph, None) {
      let chain = cycle_chain(&graph, cycle.node_id())
        .into_iter()
        .filter_map(|n| self.target(graph[n]).ok())
        .map(|t| t.path().to_string())
        .collect::<Vec<_>>()
        .join(" -> ");
      warn!(%chain, "dependency cycle detected");
      return Err(Error::CycleDetected { chain });
    }

    for reached in nodes.keys() {
      self.target(*reached)?.acyclic.set(true);
    }
    debug!(
      target_path = %self.target(id)?.path(),
      targets = graph.node_count(),
      edges = graph.edge_count(),
      "dependency graph is acyclic"
    );
    Ok(())
  }

  /// Every reachable dependency with its first-seen visibility, sorted by ordinal.
  pub fn resolve_dependencies(&self, id: TargetId) -> Result<&[ResolvedDependency]> {
    let target = self.target(id)?;
    if let Some(resolved) = target.resolved.get() {
      return Ok(resolved);
    }
    self.settle(target)?;
    Ok(target.resolved.get_or_init(Vec::new))
  }

  /// Build-order index: strictly greater than every dependency's.
  ///
  /// Dependencies are numbered first, in path order. The first call assigns
  /// the number; later calls return it without touching the counter.
  pub fn ordinal(&self, id: TargetId) -> Result<u64> {
    let target = self.target(id)?;
    if let Some(ordinal) = target.ordinal.get() {
      return Ok(*ordinal);
    }
    self.settle(target)?;
    Ok(target.ordinal.get().copied().unwrap_or_default())
  }

  /// Assign the ordinal and resolve the dependency map together, so either
  /// query leaves the target `Resolved`.
  fn settle(&self, target: &Target) -> Result<()> {
    self.verify_acyclic(target.id())?;

    let mut dependencies = self
      .links(target.id())?
      .iter()
      .map(|l| self.target(l.target))
      .collect::<Result<Vec<_>>>()?;
    dependencies.sort_by(|a, b| a.path().cmp(b.path()));
    for dependency in dependencies {
      self.ordinal(dependency.id())?;
    }
    let ordinal = self.ordinals.get() + 1;
    self.ordinals.set(ordinal);
    target.ordinal.get_or_init(|| ordinal);
    trace!(target_path = %target.path(), ordinal, "assigned ordinal");

    let resolved = self.collect_dependencies(target)?;
    debug!(target_path = %target.path(), count = resolved.len(), "resolved dependencies");
    target.resolved.get_or_init(|| resolved);
    target.set_state(TargetState::Resolved);
    Ok(())
  }

  fn collect_dependencies(&self, target: &Target) -> Result<Vec<ResolvedDependency>> {
    let links = self.links(target.id())?;
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();
    let mut record = |dep: ResolvedDependency, resolved: &mut Vec<ResolvedDependency>| {
      if seen.insert(dep.target) {
        resolved.push(dep);
      }
    };

    for link in links.iter().filter(|l| l.visibility == Visibility::Private) {
      record(*link, &mut resolved);
    }
    for visibility in [Visibility::Public, Visibility::Runtime] {
      for link in links.iter().filter(|l| l.visibility == visibility) {
        record(*link, &mut resolved);
        for inherited in self.resolve_dependencies(link.target)? {
          if inherited.visibility.is_transitive() {
            record(*inherited, &mut resolved);
          }
        }
      }
    }

    let mut ordinals = HashMap::with_capacity(resolved.len());
    for dep in &resolved {
      ordinals.insert(dep.target, self.ordinal(dep.target)?);
    }
    resolved.sort_by_key(|dep| ordinals.get(&dep.target).copied().unwrap_or(u64::MAX));
    Ok(resolved)
  }

  /// Every target, dependencies first.
  pub fn build_order(&self) -> Result<Vec<TargetId>> {
    let mut keyed = Vec::with_capacity(self.targets.len());
    for target in &self.targets {
      keyed.push((self.ordinal(target.id())?, target.id()));
    }
    keyed.sort();
    Ok(keyed.into_iter().map(|(_, id)| id).collect())
  }
}

/// Shortest cycle through `start`, rotated to begin at the earliest declared
/// target and closed by repeating it: `[a, b, a]`.
fn cycle_chain(graph: &DiGraph<TargetId, ()>, start: NodeIndex) -> Vec<NodeIndex> {
  let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
  let mut queue = VecDeque::from([start]);
  let mut cycle = vec![start];

  'search: while let Some(node) = queue.pop_front() {
    for next in graph.neighbors(node) {
      if next == start {
        cycle = vec![node];
        let mut current = node;
        while current != start {
          match parent.get(&current) {
            Some(p) => {
              current = *p;
              cycle.push(current);
            }
            None => break,
          }
        }
        cycle.reverse();
        break 'search;
      }
      if !parent.contains_key(&next) {
        parent.insert(next, node);
        queue.push_back(next);
      }
    }
  }

  if let Some(first) = (0..cycle.len()).min_by_key(|&i| graph[cycle[i]]) {
    cycle.rotate_left(first);
  }
  cycle.push(cycle[0]);
  cycle
}
