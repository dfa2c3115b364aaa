use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::props::{PropertyGraph, PropertyHost};
use crate::render::CpuCanvas;
use crate::scene::node::{Node, NodeDecl, NodeDeclKind, NodeFactory, NodeHandle};
use crate::transition::Transition;

/// What a reload did to the scene graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeChanges {
    /// Newly created nodes (ids, `None` for anonymous nodes).
    pub added: Vec<Option<String>>,
    /// Matched nodes and the properties that changed on them.
    pub updated: Vec<(String, Vec<String>)>,
    /// Matched ids whose kind or `js` changed, so the node was rebuilt.
    pub recreated: Vec<String>,
    pub removed: Vec<Option<String>>,
}

impl NodeChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.updated.is_empty()
            && self.recreated.is_empty()
            && self.removed.is_empty()
    }
}

/// Arena of scene and group nodes with an `id -> handle` index.
///
/// Handles stay valid until the node is removed; freed slots are reused.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    free: Vec<u32>,
    ids: HashMap<String, NodeHandle>,
    roots: Vec<NodeHandle>,
    next_marker: u64,
    factory: NodeFactory,
    pub(crate) surfaces: HashMap<NodeHandle, CpuCanvas>,
}

impl SceneGraph {
    pub fn new(factory: NodeFactory) -> Self {
        Self {
            factory,
            ..Self::default()
        }
    }

    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn roots(&self) -> &[NodeHandle] {
        &self.roots
    }

    pub fn get(&self, h: NodeHandle) -> Option<&Node> {
        self.nodes.get(h.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, h: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(h.index()).and_then(Option::as_mut)
    }

    pub fn handle(&self, id: &str) -> Option<NodeHandle> {
        self.ids.get(id).copied()
    }

    pub fn by_id(&self, id: &str) -> Option<&Node> {
        self.get(self.handle(id)?)
    }

    pub fn by_id_mut(&mut self, id: &str) -> Option<&mut Node> {
        let h = self.handle(id)?;
        self.get_mut(h)
    }

    /// Live handles in arena order.
    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_some())
            .map(|(i, _)| NodeHandle(i as u32))
    }

    /// Scene-level mix transition with the given id.
    pub fn transition(&self, id: &str) -> Option<&Transition> {
        self.nodes
            .iter()
            .flatten()
            .filter_map(|n| n.as_scene()?.mix.as_ref())
            .find(|t| t.id() == Some(id))
    }

    pub fn transition_mut(&mut self, id: &str) -> Option<&mut Transition> {
        self.nodes
            .iter_mut()
            .flatten()
            .filter_map(|n| n.as_scene_mut()?.mix.as_mut())
            .find(|t| t.id() == Some(id))
    }

    /// Handles in draw-declaration order: roots first to last, children depth first.
    pub fn walk_order(&self) -> Vec<NodeHandle> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut seen = HashSet::new();
        for &r in &self.roots {
            self.walk_into(r, &mut out, &mut seen);
        }
        out
    }

    fn walk_into(&self, h: NodeHandle, out: &mut Vec<NodeHandle>, seen: &mut HashSet<NodeHandle>) {
        if !seen.insert(h) {
            return;
        }
        out.push(h);
        if let Some(g) = self.get(h).and_then(Node::as_group) {
            for &c in g.children() {
                self.walk_into(c, out, seen);
            }
        }
    }

    /// Append a new root subtree. Ids already in the graph are not reused.
    pub fn add_root(&mut self, decl: &NodeDecl) -> NodeHandle {
        let mut changes = NodeChanges::default();
        let mut claimed: HashSet<String> = self.ids.keys().cloned().collect();
        let h = self.create(decl, &mut claimed, &mut changes);
        self.roots.push(h);
        h
    }

    /// Remove every node and release offscreen surfaces.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.ids.clear();
        self.roots.clear();
        self.surfaces.clear();
    }

    fn alloc(&mut self, node: Node) -> NodeHandle {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = Some(node);
                NodeHandle(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeHandle((self.nodes.len() - 1) as u32)
            }
        }
    }

    fn next_marker(&mut self) -> u64 {
        self.next_marker += 1;
        self.next_marker
    }

    /// Build a fresh subtree. Ids already claimed in this pass are dropped from the copy.
    fn create(
        &mut self,
        decl: &NodeDecl,
        claimed: &mut HashSet<String>,
        changes: &mut NodeChanges,
    ) -> NodeHandle {
        let marker = self.next_marker();
        let mut node = Node::build(decl, &self.factory, marker);
        if let Some(id) = node.id().map(str::to_owned) {
            if !claimed.insert(id.clone()) {
                warn!(id = %id, "duplicate id; the later node stays anonymous");
                node.clear_id();
            }
        }
        let id = node.id().map(str::to_owned);
        let h = self.alloc(node);
        if let Some(id) = &id {
            self.ids.insert(id.clone(), h);
        }
        changes.added.push(id);

        if let NodeDeclKind::Group { children } = &decl.kind {
            let kids: Vec<NodeHandle> = children
                .iter()
                .map(|c| self.reconcile(c, claimed, changes))
                .collect();
            if let Some(g) = self.get_mut(h).and_then(Node::as_group_mut) {
                g.children = kids;
            }
        }
        h
    }

    /// Match `decl` against the live node with the same id, or create it.
    fn reconcile(
        &mut self,
        decl: &NodeDecl,
        claimed: &mut HashSet<String>,
        changes: &mut NodeChanges,
    ) -> NodeHandle {
        let matched = decl
            .id
            .as_deref()
            .filter(|id| !claimed.contains(*id))
            .and_then(|id| self.handle(id).map(|h| (id.to_owned(), h)));
        let Some((id, h)) = matched else {
            return self.create(decl, claimed, changes);
        };

        let compatible = self.get(h).is_some_and(|live| match (&decl.kind, live.as_scene()) {
            (NodeDeclKind::Scene { js }, Some(s)) => s.js() == js,
            (NodeDeclKind::Group { .. }, None) => true,
            _ => false,
        });
        if !compatible {
            debug!(id = %id, "node kind or js changed; recreating");
            self.ids.remove(&id);
            changes.recreated.push(id);
            return self.create(decl, claimed, changes);
        }
        claimed.insert(id.clone());

        let fresh = Node::build(decl, &self.factory, 0);
        let mut changed = Vec::new();
        if let Some(live) = self.get_mut(h) {
            for name in fresh.property_names() {
                let new = fresh.get_property(&name);
                if live.get_property(&name) == new {
                    continue;
                }
                let Some(new) = new else {
                    continue;
                };
                // One write per property so each side effect runs.
                match live.set_property(&name, new) {
                    Ok(()) => changed.push(name),
                    Err(err) => {
                        warn!(id = %id, property = %name, error = %err, "reload value rejected")
                    }
                }
            }
        }

        if let NodeDeclKind::Group { children } = &decl.kind {
            let kids: Vec<NodeHandle> = children
                .iter()
                .map(|c| self.reconcile(c, claimed, changes))
                .collect();
            if let Some(g) = self.get_mut(h).and_then(Node::as_group_mut) {
                if g.children != kids {
                    debug!(id = %id, "group children rebuilt");
                }
                g.children = kids;
            }
        }
        if !changed.is_empty() {
            changes.updated.push((id, changed));
        }
        h
    }

    /// Diff the live graph against a reloaded set of root declarations.
    ///
    /// Nodes are matched by id and updated in place; anonymous nodes are rebuilt, and nodes
    /// no longer declared are removed along with their offscreen surfaces.
    pub fn apply_roots(&mut self, decls: &[NodeDecl]) -> NodeChanges {
        let mut changes = NodeChanges::default();
        let mut claimed = HashSet::new();
        let before: Vec<NodeHandle> = self.handles().collect();

        let roots: Vec<NodeHandle> = decls
            .iter()
            .map(|d| self.reconcile(d, &mut claimed, &mut changes))
            .collect();
        self.roots = roots;

        // Unmatched and anonymous nodes are no longer reachable from the new roots.
        let reachable: HashSet<NodeHandle> = self.walk_order().into_iter().collect();
        for h in before {
            if reachable.contains(&h) {
                continue;
            }
            if let Some(node) = self.nodes[h.index()].take() {
                let id = node.id().map(str::to_owned);
                if let Some(id) = &id {
                    if self.ids.get(id) == Some(&h) {
                        self.ids.remove(id);
                    }
                }
                if !id.as_ref().is_some_and(|id| changes.recreated.contains(id)) {
                    changes.removed.push(id);
                }
            }
            self.surfaces.remove(&h);
            self.free.push(h.0);
        }
        changes
    }
}

impl PropertyGraph for SceneGraph {
    fn host(&self, id: &str) -> Option<&dyn PropertyHost> {
        if let Some(n) = self.by_id(id) {
            return Some(n);
        }
        self.transition(id).map(|t| t as &dyn PropertyHost)
    }

    fn host_mut(&mut self, id: &str) -> Option<&mut dyn PropertyHost> {
        if let Some(h) = self.handle(id) {
            return self.get_mut(h).map(|n| n as &mut dyn PropertyHost);
        }
        self.transition_mut(id).map(|t| t as &mut dyn PropertyHost)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
