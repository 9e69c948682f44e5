//! Minimal workflow engine.
//!
//! Named async nodes connected by directed edges between the virtual `START`
//! and `END` markers. `compile` rejects unknown endpoints, self loops, cycles
//! and nodes unreachable from `START`; the compiled graph runs nodes one at a
//! time in topological order, merging each node's update into the state
//! before the next node starts.

use async_trait::async_trait;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::types::{GuideError, Result};

pub const START: &str = "__start__";
pub const END: &str = "__end__";

const START_ID: usize = 0;
const END_ID: usize = 1;

/// State threaded through a graph run
pub trait GraphState: Send + Sync + 'static {
    type Update: Send;

    /// Merge a node's partial update
    fn apply(&mut self, update: Self::Update);
}

#[async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    async fn run(&self, state: &S) -> Result<S::Update>;
}

pub type SharedNode<S> = Arc<dyn Node<S>>;

// =============================================================================
// Builder
// =============================================================================

pub struct StateGraph<S: GraphState> {
    names: Vec<String>,
    nodes: HashMap<String, SharedNode<S>>,
    edges: Vec<(String, String)>,
}

impl<S: GraphState> Default for StateGraph<S> {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            nodes: HashMap::new(),
            edges: Vec::new(),
        }
    }
}

impl<S: GraphState> StateGraph<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: impl Into<String>, node: SharedNode<S>) -> Result<&mut Self> {
        let name = name.into();
        if name == START || name == END {
            return Err(GuideError::Graph(format!("'{}' is a reserved node name", name)));
        }
        if self.nodes.contains_key(&name) {
            return Err(GuideError::Graph(format!("Duplicate node: {}", name)));
        }
        self.names.push(name.clone());
        self.nodes.insert(name, node);
        Ok(self)
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    fn id_of(&self, name: &str) -> Option<usize> {
        match name {
            START => Some(START_ID),
            END => Some(END_ID),
            _ => self.names.iter().position(|n| n == name).map(|i| i + 2),
        }
    }

    pub fn compile(mut self) -> Result<CompiledGraph<S>> {
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
        graph.add_node(START_ID);
        graph.add_node(END_ID);
        for i in 0..self.names.len() {
            graph.add_node(i + 2);
        }

        for (from, to) in &self.edges {
            let (Some(a), Some(b)) = (self.id_of(from), self.id_of(to)) else {
                return Err(GuideError::Graph(format!(
                    "Edge {} -> {} references an unknown node",
                    from, to
                )));
            };
            if a == b {
                return Err(GuideError::Graph(format!("Self loop on {}", from)));
            }
            if b == START_ID || a == END_ID {
                return Err(GuideError::Graph(format!(
                    "Edge {} -> {} points into START or out of END",
                    from, to
                )));
            }
            graph.add_edge(a, b, ());
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            GuideError::Graph(format!(
                "Cycle detected at node {}",
                self.name_of(cycle.node_id())
            ))
        })?;

        let mut reachable = vec![false; self.names.len() + 2];
        let mut dfs = Dfs::new(&graph, START_ID);
        while let Some(id) = dfs.next(&graph) {
            reachable[id] = true;
        }
        if let Some(id) = (2..reachable.len()).find(|&id| !reachable[id]) {
            return Err(GuideError::Graph(format!(
                "Node {} is not reachable from {}",
                self.name_of(id),
                START
            )));
        }

        let mut steps = Vec::with_capacity(self.names.len());
        for id in order.into_iter().filter(|&id| id >= 2) {
            let name = self.names[id - 2].clone();
            let node = self
                .nodes
                .remove(&name)
                .ok_or_else(|| GuideError::Graph(format!("Missing node: {}", name)))?;
            steps.push((name, node));
        }

        Ok(CompiledGraph { steps })
    }

    fn name_of(&self, id: usize) -> &str {
        match id {
            START_ID => START,
            END_ID => END,
            _ => &self.names[id - 2],
        }
    }
}

// =============================================================================
// Runnable
// =============================================================================

pub struct CompiledGraph<S: GraphState> {
    steps: Vec<(String, SharedNode<S>)>,
}

impl<S: GraphState> CompiledGraph<S> {
    /// Node names in execution order
    pub fn node_order(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub async fn run(&self, mut state: S) -> Result<S> {
        for (name, node) in &self.steps {
            let started = Instant::now();
            debug!(node = %name, "Running graph node");

            let update = node.run(&state).await?;
            state.apply(update);

            info!(
                node = %name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Graph node completed"
            );
        }
        Ok(state)
    }
}
