//! The component-graph collaborator. The real topology source -
//! discovery, ingestion, live reconfiguration - is out of scope;
//! this module only defines the trait the core depends on plus a simple
//! in-memory implementation for tests and demos.
#![allow(dead_code)]
use std::collections::{HashMap, HashSet};

use crate::domain::types::{Component, ComponentCategory, ComponentId};

/// Read-only view of the component graph the actor is wired against. The
/// mapping is fixed for the actor's lifetime.
pub trait ComponentGraph: Send + Sync {
    fn components(&self, category: ComponentCategory) -> HashSet<Component>;
    fn successors(&self, id: ComponentId) -> HashSet<Component>;
    fn predecessors(&self, id: ComponentId) -> HashSet<Component>;
    fn component_category(&self, id: ComponentId) -> Option<ComponentCategory>;
}

/// A fixed, in-memory component graph built from an adjacency list. Not a
/// production topology source, see module docs.
#[derive(Debug, Clone, Default)]
pub struct StaticComponentGraph {
    components: HashMap<ComponentId, ComponentCategory>,
    successors: HashMap<ComponentId, HashSet<ComponentId>>,
    predecessors: HashMap<ComponentId, HashSet<ComponentId>>,
}

impl StaticComponentGraph {
    pub fn builder() -> StaticComponentGraphBuilder {
        StaticComponentGraphBuilder::default()
    }
}

impl ComponentGraph for StaticComponentGraph {
    fn components(&self, category: ComponentCategory) -> HashSet<Component> {
        self.components
            .iter()
            .filter(|(_, c)| **c == category)
            .map(|(id, c)| Component {
                id: *id,
                category: *c,
            })
            .collect()
    }

    fn successors(&self, id: ComponentId) -> HashSet<Component> {
        self.successors
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|succ_id| {
                self.components.get(succ_id).map(|c| Component {
                    id: *succ_id,
                    category: *c,
                })
            })
            .collect()
    }

    fn predecessors(&self, id: ComponentId) -> HashSet<Component> {
        self.predecessors
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|pred_id| {
                self.components.get(pred_id).map(|c| Component {
                    id: *pred_id,
                    category: *c,
                })
            })
            .collect()
    }

    fn component_category(&self, id: ComponentId) -> Option<ComponentCategory> {
        self.components.get(&id).copied()
    }
}

/// Builds a `StaticComponentGraph` one component/edge at a time. Edges
/// are undirected for graph-membership purposes but `successors`/
/// `predecessors` are tracked separately to match the directed semantics
/// real topology sources expose (power flows from battery to inverter,
/// not the reverse).
#[derive(Default)]
pub struct StaticComponentGraphBuilder {
    graph: StaticComponentGraph,
}

impl StaticComponentGraphBuilder {
    pub fn component(mut self, id: ComponentId, category: ComponentCategory) -> Self {
        self.graph.components.insert(id, category);
        self.graph.successors.entry(id).or_default();
        self.graph.predecessors.entry(id).or_default();
        self
    }

    /// `from` -> `to`: `to` becomes a successor of `from`, `from` a
    /// predecessor of `to`.
    pub fn edge(mut self, from: ComponentId, to: ComponentId) -> Self {
        self.graph.successors.entry(from).or_default().insert(to);
        self.graph.predecessors.entry(to).or_default().insert(from);
        self
    }

    /// Convenience for the battery<->inverter pair topology this crate's
    /// tests use throughout: links both directions since power can flow
    /// either way across the pair.
    pub fn battery_inverter_pair(self, battery_id: ComponentId, inverter_id: ComponentId) -> Self {
        self.edge(battery_id, inverter_id).edge(inverter_id, battery_id)
    }

    pub fn build(self) -> StaticComponentGraph {
        self.graph
    }
}
