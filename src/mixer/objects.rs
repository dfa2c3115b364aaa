use crate::props::{PropertyGraph, PropertyHost};
use crate::scene::SceneGraph;
use crate::sequence::Sequence;

/// Every updatable live object, addressed by id: scene nodes, scene mix transitions,
/// sequences, and sequence transitions, looked up in that order.
pub(crate) struct LiveObjects<'a> {
    pub graph: &'a mut SceneGraph,
    pub sequences: &'a mut [Sequence],
}

impl PropertyGraph for LiveObjects<'_> {
    fn host(&self, id: &str) -> Option<&dyn PropertyHost> {
        if let Some(h) = self.graph.host(id) {
            return Some(h);
        }
        if let Some(s) = self.sequences.iter().find(|s| s.id() == Some(id)) {
            return Some(s);
        }
        self.sequences
            .iter()
            .filter_map(Sequence::transition)
            .find(|t| t.id() == Some(id))
            .map(|t| t as &dyn PropertyHost)
    }

    fn host_mut(&mut self, id: &str) -> Option<&mut dyn PropertyHost> {
        if self.graph.host(id).is_some() {
            return self.graph.host_mut(id);
        }
        if let Some(i) = self.sequences.iter().position(|s| s.id() == Some(id)) {
            return Some(&mut self.sequences[i]);
        }
        self.sequences
            .iter_mut()
            .filter_map(Sequence::transition_mut)
            .find(|t| t.id() == Some(id))
            .map(|t| t as &mut dyn PropertyHost)
    }
}
