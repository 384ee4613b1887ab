//! The Graph Mirror: an in-process projection of the symbol graph used
//! for traversal queries (lineage, impact analysis, analytics) that would
//! be painful to express as recursive SQL. One `StableDiGraph` per
//! project, rebuilt wholesale by the `graph_sync` pipeline stage and
//! swapped in atomically so readers never see a half-built graph.

use std::collections::{HashSet, VecDeque};

use dashmap::DashMap;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction as PetDirection;

use crate::enums::{Direction, EdgeType, SymbolKind};
use crate::ids::{ProjectId, SymbolId};

#[derive(Debug, Clone)]
pub struct MirrorNode {
    pub symbol_id: SymbolId,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone)]
pub struct MirrorEdge {
    pub edge_type: EdgeType,
    pub confidence: f32,
}

/// One project's graph projection. Node lookup by `SymbolId` is O(1) via
/// the side index; traversal goes through petgraph directly.
pub struct GraphMirror {
    inner: StableDiGraph<MirrorNode, MirrorEdge>,
    index_of: std::collections::HashMap<SymbolId, NodeIndex>,
}

impl GraphMirror {
    pub fn new() -> Self {
        Self {
            inner: StableDiGraph::new(),
            index_of: std::collections::HashMap::new(),
        }
    }

    pub fn add_node(&mut self, symbol_id: SymbolId, kind: SymbolKind) -> NodeIndex {
        if let Some(&idx) = self.index_of.get(&symbol_id) {
            return idx;
        }
        let idx = self.inner.add_node(MirrorNode { symbol_id, kind });
        self.index_of.insert(symbol_id, idx);
        idx
    }

    pub fn add_edge(
        &mut self,
        source: SymbolId,
        target: SymbolId,
        edge_type: EdgeType,
        confidence: f32,
    ) {
        let Some(&source_idx) = self.index_of.get(&source) else {
            return;
        };
        let Some(&target_idx) = self.index_of.get(&target) else {
            return;
        };
        self.inner.add_edge(
            source_idx,
            target_idx,
            MirrorEdge {
                edge_type,
                confidence,
            },
        );
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn contains(&self, symbol_id: SymbolId) -> bool {
        self.index_of.contains_key(&symbol_id)
    }

    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.inner.node_weights().map(|n| n.symbol_id)
    }

    /// Bounded BFS lineage walk from `root` in the given direction,
    /// pruned by `max_depth` and by `stop_at_kinds` (a node of one of
    /// those kinds is included in the result but not expanded further).
    pub fn lineage(
        &self,
        root: SymbolId,
        direction: Direction,
        max_depth: u32,
        stop_at_kinds: &HashSet<SymbolKind>,
    ) -> Vec<LineagePath> {
        let Some(&root_idx) = self.index_of.get(&root) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(root_idx);
        let mut queue = VecDeque::new();
        queue.push_back((root_idx, 0u32, Vec::<(SymbolId, EdgeType, f32)>::new()));

        while let Some((current, depth, path)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let node = &self.inner[current];
            if depth > 0 && stop_at_kinds.contains(&node.kind) {
                continue;
            }

            for dir in directions_to_walk(direction) {
                for edge_ref in self.inner.edges_directed(current, dir) {
                    let neighbor = match dir {
                        PetDirection::Outgoing => edge_ref.target(),
                        PetDirection::Incoming => edge_ref.source(),
                    };
                    if !visited.insert(neighbor) {
                        continue;
                    }
                    let edge = edge_ref.weight();
                    let mut next_path = path.clone();
                    let neighbor_symbol = self.inner[neighbor].symbol_id;
                    next_path.push((neighbor_symbol, edge.edge_type, edge.confidence));
                    results.push(LineagePath {
                        path: next_path.clone(),
                    });
                    queue.push_back((neighbor, depth + 1, next_path));
                }
            }
        }

        results
    }

    /// Shortest path (by edge count) between two symbols, if one exists
    /// within `max_depth` hops. Used by `analyze_impact`'s reverse-edge
    /// traversal to explain why a downstream symbol is affected.
    pub fn shortest_path(
        &self,
        from: SymbolId,
        to: SymbolId,
        max_depth: u32,
    ) -> Option<Vec<SymbolId>> {
        let from_idx = *self.index_of.get(&from)?;
        let to_idx = *self.index_of.get(&to)?;

        let mut visited = HashSet::new();
        visited.insert(from_idx);
        let mut queue = VecDeque::new();
        queue.push_back((from_idx, vec![from]));

        while let Some((current, path)) = queue.pop_front() {
            if current == to_idx {
                return Some(path);
            }
            if path.len() as u32 > max_depth {
                continue;
            }
            for edge_ref in self.inner.edges_directed(current, PetDirection::Outgoing) {
                let neighbor = edge_ref.target();
                if visited.insert(neighbor) {
                    let mut next_path = path.clone();
                    next_path.push(self.inner[neighbor].symbol_id);
                    queue.push_back((neighbor, next_path));
                }
            }
        }
        None
    }

    pub fn in_degree(&self, symbol_id: SymbolId) -> usize {
        self.index_of
            .get(&symbol_id)
            .map(|&idx| {
                self.inner
                    .edges_directed(idx, PetDirection::Incoming)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn out_degree(&self, symbol_id: SymbolId) -> usize {
        self.index_of
            .get(&symbol_id)
            .map(|&idx| {
                self.inner
                    .edges_directed(idx, PetDirection::Outgoing)
                    .count()
            })
            .unwrap_or(0)
    }

    /// All (source, target, edge) triples, for PageRank and bridge
    /// aggregation to iterate without re-deriving indices.
    pub fn all_edges(&self) -> impl Iterator<Item = (SymbolId, SymbolId, &MirrorEdge)> {
        self.inner.edge_indices().map(move |idx| {
            let (s, t) = self.inner.edge_endpoints(idx).expect("edge index valid");
            (
                self.inner[s].symbol_id,
                self.inner[t].symbol_id,
                &self.inner[idx],
            )
        })
    }
}

impl Default for GraphMirror {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct LineagePath {
    /// `(symbol, edge leading to it, confidence)` hops from the root,
    /// in traversal order.
    pub path: Vec<(SymbolId, EdgeType, f32)>,
}

fn directions_to_walk(direction: Direction) -> Vec<PetDirection> {
    match direction {
        Direction::Upstream => vec![PetDirection::Incoming],
        Direction::Downstream => vec![PetDirection::Outgoing],
        Direction::Both => vec![PetDirection::Outgoing, PetDirection::Incoming],
    }
}

/// Per-tenant collection of per-project mirrors. The pipeline rebuilds
/// one project's mirror and swaps it in; readers never block on writers
/// of a different project.
#[derive(Default)]
pub struct GraphMirrorRegistry {
    mirrors: DashMap<ProjectId, GraphMirror>,
}

impl GraphMirrorRegistry {
    pub fn new() -> Self {
        Self {
            mirrors: DashMap::new(),
        }
    }

    pub fn swap(&self, project_id: ProjectId, mirror: GraphMirror) {
        self.mirrors.insert(project_id, mirror);
    }

    pub fn get(&self, project_id: ProjectId) -> Option<dashmap::mapref::one::Ref<'_, ProjectId, GraphMirror>> {
        self.mirrors.get(&project_id)
    }

    pub fn remove(&self, project_id: ProjectId) {
        self.mirrors.remove(&project_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror_with_chain() -> (GraphMirror, SymbolId, SymbolId, SymbolId) {
        let mut mirror = GraphMirror::new();
        let a = SymbolId::new();
        let b = SymbolId::new();
        let c = SymbolId::new();
        mirror.add_node(a, SymbolKind::Table);
        mirror.add_node(b, SymbolKind::View);
        mirror.add_node(c, SymbolKind::Column);
        mirror.add_edge(a, b, EdgeType::UsesTable, 0.9);
        mirror.add_edge(b, c, EdgeType::UsesColumn, 0.85);
        (mirror, a, b, c)
    }

    #[test]
    fn downstream_lineage_walks_forward() {
        let (mirror, a, b, c) = mirror_with_chain();
        let paths = mirror.lineage(a, Direction::Downstream, 5, &HashSet::new());
        let reached: HashSet<_> = paths.iter().flat_map(|p| p.path.last()).map(|(s, _, _)| *s).collect();
        assert!(reached.contains(&b));
        assert!(reached.contains(&c));
    }

    #[test]
    fn upstream_lineage_walks_backward() {
        let (mirror, a, _b, c) = mirror_with_chain();
        let paths = mirror.lineage(c, Direction::Upstream, 5, &HashSet::new());
        let reached: HashSet<_> = paths.iter().flat_map(|p| p.path.last()).map(|(s, _, _)| *s).collect();
        assert!(reached.contains(&a));
    }

    #[test]
    fn stop_at_kinds_prunes_expansion_but_keeps_the_node() {
        let (mirror, a, b, c) = mirror_with_chain();
        let mut stop = HashSet::new();
        stop.insert(SymbolKind::View);
        let paths = mirror.lineage(a, Direction::Downstream, 5, &stop);
        let reached: HashSet<_> = paths.iter().flat_map(|p| p.path.last()).map(|(s, _, _)| *s).collect();
        assert!(reached.contains(&b));
        assert!(!reached.contains(&c));
    }

    #[test]
    fn max_depth_bounds_traversal() {
        let (mirror, a, b, c) = mirror_with_chain();
        let paths = mirror.lineage(a, Direction::Downstream, 1, &HashSet::new());
        let reached: HashSet<_> = paths.iter().flat_map(|p| p.path.last()).map(|(s, _, _)| *s).collect();
        assert!(reached.contains(&b));
        assert!(!reached.contains(&c));
    }

    #[test]
    fn shortest_path_finds_chain() {
        let (mirror, a, b, c) = mirror_with_chain();
        let path = mirror.shortest_path(a, c, 5).unwrap();
        assert_eq!(path, vec![a, b, c]);
    }

    #[test]
    fn shortest_path_none_when_unreachable() {
        let (mirror, _a, _b, c) = mirror_with_chain();
        let stray = SymbolId::new();
        assert!(mirror.shortest_path(c, stray, 5).is_none());
    }

    #[test]
    fn degree_counts() {
        let (mirror, a, b, _c) = mirror_with_chain();
        assert_eq!(mirror.out_degree(a), 1);
        assert_eq!(mirror.in_degree(b), 1);
        assert_eq!(mirror.out_degree(b), 1);
    }

    #[test]
    fn registry_swap_replaces_atomically() {
        let registry = GraphMirrorRegistry::new();
        let project_id = ProjectId::new();
        let (mirror, ..) = mirror_with_chain();
        registry.swap(project_id, mirror);
        assert_eq!(registry.get(project_id).unwrap().node_count(), 3);
    }
}
