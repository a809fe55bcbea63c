//! Per-level occupancy statistics.

use crate::node::{ArrayNode, Slot, SlotState};
use crate::reclaim::Reclaim;
use crate::stats::{LevelStatistics, StatSink};

use super::HashTrie;

impl<'a, T, const N: usize, R, S> HashTrie<'a, T, N, R, S>
where
    R: Reclaim,
    S: StatSink,
{
    /// Occupancy of every array node at `level` (0 is the head).
    ///
    /// Returns `None` past [`max_height`](Self::max_height). A level the
    /// trie has not grown to yet reports zero nodes. Approximate under
    /// concurrent modification.
    #[must_use]
    pub fn level_statistics(&self, level: usize) -> Option<LevelStatistics> {
        if level >= self.geometry.max_height() {
            return None;
        }

        let _guard = self.guard();
        let mut frontier: Vec<&ArrayNode> = vec![&*self.head];
        for _ in 0..level {
            frontier = self.children_of(&frontier);
        }

        Some(self.summarize(level, &frontier))
    }

    /// Statistics for every populated level, head first.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    #[must_use]
    pub fn all_level_statistics(&self) -> Vec<LevelStatistics> {
        let _guard = self.guard();
        let mut levels: Vec<LevelStatistics> = Vec::new();
        let mut frontier: Vec<&ArrayNode> = vec![&*self.head];

        while !frontier.is_empty() {
            levels.push(self.summarize(levels.len(), &frontier));
            frontier = self.children_of(&frontier);
        }
        levels
    }

    /// Array nodes linked from `nodes`, one level down.
    fn children_of<'s>(&'s self, nodes: &[&'s ArrayNode]) -> Vec<&'s ArrayNode> {
        nodes
            .iter()
            .copied()
            .flat_map(ArrayNode::slots)
            .filter_map(|slot: &'s Slot| match self.load_slot(slot).1 {
                SlotState::Array(child) => Some(child),
                _ => None,
            })
            .collect()
    }

    fn summarize(&self, level: usize, nodes: &[&ArrayNode]) -> LevelStatistics {
        let mut stats = LevelStatistics {
            array_node_count: nodes.len(),
            node_capacity: self.geometry.node_size_at(level),
            ..LevelStatistics::default()
        };

        for node in nodes {
            for slot in node.slots() {
                match self.load_slot(slot).1 {
                    SlotState::Empty => stats.empty_cell_count += 1,
                    SlotState::Leaf(_) | SlotState::Converting(_) => stats.data_cell_count += 1,
                    SlotState::Array(_) => stats.array_cell_count += 1,
                }
            }
        }
        stats
    }
}
