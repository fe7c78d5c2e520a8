//! Phase graph construction and successor lookup.
//!
//! The builder takes a root phase and an ordered list of entries, validates
//! them, and freezes the result into a `PhaseGraph`. The graph is the sole
//! source of truth for which transitions are legal, so every structural
//! problem is reported as a `ConfigError` before a session starts.

use std::collections::{HashMap, HashSet};

use crate::errors::ConfigError;
use crate::phase::{Phase, PhaseEntry};

/// An immutable, validated graph of attack phases.
#[derive(Debug, Clone)]
pub struct PhaseGraph {
    root: Phase,
    /// Entries in configured order
    entries: Vec<PhaseEntry>,
    /// Map from phase name to entry index
    index_map: HashMap<Phase, usize>,
    /// Phases that only appear as successors, in first-seen order
    terminal_only: Vec<Phase>,
}

impl PhaseGraph {
    /// The phase every session starts from.
    pub fn root(&self) -> &Phase {
        &self.root
    }

    /// Entries in the order they were configured.
    pub fn entries(&self) -> &[PhaseEntry] {
        &self.entries
    }

    /// Ordered successors of `phase`. Empty when the phase is terminal or unknown.
    pub fn successors(&self, phase: &str) -> &[Phase] {
        self.index_map
            .get(phase)
            .and_then(|&i| self.entries.get(i))
            .map_or(&[], |entry| entry.successors.as_slice())
    }

    pub fn is_terminal(&self, phase: &str) -> bool {
        self.successors(phase).is_empty()
    }

    pub fn contains(&self, phase: &str) -> bool {
        self.index_map.contains_key(phase) || self.terminal_only.iter().any(|p| p == phase)
    }

    /// Every known phase: entries first, then successor-only phases.
    pub fn phases(&self) -> Vec<&Phase> {
        self.entries
            .iter()
            .map(|e| &e.name)
            .chain(self.terminal_only.iter())
            .collect()
    }

    /// Phases with no outgoing edges.
    pub fn terminal_phases(&self) -> Vec<&Phase> {
        self.phases()
            .into_iter()
            .filter(|p| self.is_terminal(p.as_str()))
            .collect()
    }

    /// Phases that cannot be reached from the root, in `phases()` order.
    pub fn unreachable_phases(&self) -> Vec<&Phase> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack = vec![self.root.as_str()];
        while let Some(phase) = stack.pop() {
            if seen.insert(phase) {
                stack.extend(self.successors(phase).iter().map(Phase::as_str));
            }
        }
        self.phases()
            .into_iter()
            .filter(|p| !seen.contains(p.as_str()))
            .collect()
    }

    /// Number of phases on the longest path from the root, root included.
    pub fn longest_path_from_root(&self) -> usize {
        fn depth<'a>(
            graph: &'a PhaseGraph,
            phase: &'a Phase,
            memo: &mut HashMap<&'a Phase, usize>,
        ) -> usize {
            if let Some(&d) = memo.get(phase) {
                return d;
            }
            let d = 1 + graph
                .successors(phase.as_str())
                .iter()
                .map(|next| depth(graph, next, memo))
                .max()
                .unwrap_or(0);
            memo.insert(phase, d);
            d
        }

        let mut memo = HashMap::new();
        depth(self, &self.root, &mut memo)
    }
}

/// Builder for constructing phase graphs.
pub struct GraphBuilder {
    root: Phase,
    entries: Vec<PhaseEntry>,
}

impl GraphBuilder {
    pub fn new(root: Phase, entries: Vec<PhaseEntry>) -> Self {
        Self { root, entries }
    }

    /// Build the phase graph.
    ///
    /// This validates the graph structure:
    /// - Phase and successor names must be non-empty and unpadded
    /// - No phase may have two entries, and no entry may repeat a successor
    /// - The root must be a known phase
    /// - No cycles are allowed
    pub fn build(self) -> Result<PhaseGraph, ConfigError> {
        let mut index_map = HashMap::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if !entry.name.is_well_formed() {
                return Err(ConfigError::MalformedPhase {
                    index: i,
                    name: entry.name.to_string(),
                });
            }
            if index_map.insert(entry.name.clone(), i).is_some() {
                return Err(ConfigError::DuplicatePhase(entry.name.to_string()));
            }
        }

        let mut terminal_only: Vec<Phase> = Vec::new();
        for entry in &self.entries {
            let mut seen = HashSet::new();
            for successor in &entry.successors {
                if !successor.is_well_formed() {
                    return Err(ConfigError::MalformedSuccessor {
                        phase: entry.name.to_string(),
                        successor: successor.to_string(),
                    });
                }
                if !seen.insert(successor) {
                    return Err(ConfigError::DuplicateSuccessor {
                        phase: entry.name.to_string(),
                        successor: successor.to_string(),
                    });
                }
                if !index_map.contains_key(successor) && !terminal_only.contains(successor) {
                    terminal_only.push(successor.clone());
                }
            }
        }

        let graph = PhaseGraph {
            root: self.root,
            entries: self.entries,
            index_map,
            terminal_only,
        };

        if !graph.contains(graph.root.as_str()) {
            return Err(ConfigError::UnknownRoot(graph.root.to_string()));
        }

        Self::validate_no_cycles(&graph)?;

        Ok(graph)
    }

    /// Validate that the graph has no cycles using Kahn's algorithm.
    fn validate_no_cycles(graph: &PhaseGraph) -> Result<(), ConfigError> {
        let phases = graph.phases();
        let position: HashMap<&str, usize> = phases
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();

        let mut in_degree = vec![0usize; phases.len()];
        for entry in graph.entries() {
            for successor in &entry.successors {
                in_degree[position[successor.as_str()]] += 1;
            }
        }

        let mut queue: Vec<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, deg)| *deg == 0)
            .map(|(i, _)| i)
            .collect();

        let mut processed = 0;

        while let Some(node) = queue.pop() {
            processed += 1;

            for successor in graph.successors(phases[node].as_str()) {
                let idx = position[successor.as_str()];
                in_degree[idx] -= 1;
                if in_degree[idx] == 0 {
                    queue.push(idx);
                }
            }
        }

        if processed != phases.len() {
            let cycle_phases: Vec<String> = in_degree
                .iter()
                .enumerate()
                .filter(|&(_, deg)| *deg > 0)
                .map(|(i, _)| phases[i].to_string())
                .collect();

            return Err(ConfigError::Cycle(cycle_phases));
        }

        Ok(())
    }
}
