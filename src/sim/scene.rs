//! Scene graph
//!
//! The only shared mutable resource between modes, effects and the renderer.
//! Every visual lives here as a [`Node`] keyed by [`NodeId`]; the component
//! that added a node is the only one that removes it. Renderers read the
//! scene, they never mutate it.

use std::collections::BTreeMap;

use glam::Vec3;

/// Handle to a node in the scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// Visual for a live target (ring face at a fixed depth)
#[derive(Debug, Clone, PartialEq)]
pub struct TargetVisual {
    pub center: Vec3,
    pub radius: f32,
}

/// A cloud of point sprites (burst or one ripple ring)
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleCloud {
    pub positions: Vec<Vec3>,
    /// Per-particle color, same length as `positions`
    pub colors: Vec<[f32; 3]>,
    /// World-space sprite size
    pub size: f32,
    /// 0-1
    pub opacity: f32,
}

impl ParticleCloud {
    /// All particles at `origin` with a flat color
    pub fn at(origin: Vec3, count: usize, color: [f32; 3], size: f32) -> Self {
        Self {
            positions: vec![origin; count],
            colors: vec![color; count],
            size,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Target(TargetVisual),
    Particles(ParticleCloud),
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u32,
    disposed: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        if self.disposed {
            log::warn!("Scene::add after dispose, node {:?} dropped", id);
        } else {
            self.nodes.insert(id, node);
        }
        id
    }

    /// Remove a node, returning it if it was present
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn particles_mut(&mut self, id: NodeId) -> Option<&mut ParticleCloud> {
        match self.nodes.get_mut(&id) {
            Some(Node::Particles(cloud)) => Some(cloud),
            _ => None,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn targets(&self) -> impl Iterator<Item = &TargetVisual> {
        self.nodes.values().filter_map(|node| match node {
            Node::Target(visual) => Some(visual),
            Node::Particles(_) => None,
        })
    }

    pub fn particle_clouds(&self) -> impl Iterator<Item = &ParticleCloud> {
        self.nodes.values().filter_map(|node| match node {
            Node::Particles(cloud) => Some(cloud),
            Node::Target(_) => None,
        })
    }

    /// Drop every node; later `add` calls are ignored
    pub fn dispose(&mut self) {
        if !self.nodes.is_empty() {
            log::debug!("Scene dispose releasing {} nodes", self.nodes.len());
        }
        self.nodes.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_node() -> Node {
        Node::Target(TargetVisual {
            center: Vec3::ZERO,
            radius: 0.6,
        })
    }

    #[test]
    fn test_add_remove() {
        let mut scene = Scene::new();
        let a = scene.add(target_node());
        let b = scene.add(Node::Particles(ParticleCloud::at(Vec3::ZERO, 4, [1.0; 3], 0.1)));
        assert_ne!(a, b);
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.targets().count(), 1);
        assert_eq!(scene.particle_clouds().count(), 1);

        assert!(scene.remove(a).is_some());
        assert!(scene.remove(a).is_none());
        assert_eq!(scene.len(), 1);
        assert!(scene.particles_mut(b).is_some());
    }

    #[test]
    fn test_dispose_rejects_new_nodes() {
        let mut scene = Scene::new();
        scene.add(target_node());
        scene.dispose();
        assert!(scene.is_empty());

        let late = scene.add(target_node());
        assert!(!scene.contains(late));
        assert!(scene.is_disposed());
    }
}
