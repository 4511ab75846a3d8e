use std::collections::BTreeMap;

use glam::Mat4;
use momiji_assets::TextureData;
use momiji_common::{NodeId, Transform};

use crate::node::{Fog, NodeContent, SceneNode, WaterSurface};

/// The shared scene graph.
///
/// Written by the assembler, the environment setup and the clock; read by
/// renderers. Nodes form a forest: roots have no parent and detaching a node
/// removes its whole subtree.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, SceneNode>,
    background: Option<TextureData>,
    environment: Option<TextureData>,
    fog: Option<Fog>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attach a root node. Returns its id.
    pub fn attach(
        &mut self,
        label: impl Into<String>,
        transform: Transform,
        content: NodeContent,
    ) -> NodeId {
        let id = NodeId::new();
        self.insert(id, None, label.into(), transform, content);
        id
    }

    /// Attach a node under `parent`. Returns `None` if the parent is not in the graph.
    pub fn attach_child(
        &mut self,
        parent: NodeId,
        label: impl Into<String>,
        transform: Transform,
        content: NodeContent,
    ) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = NodeId::new();
        self.insert(id, Some(parent), label.into(), transform, content);
        Some(id)
    }

    fn insert(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        label: String,
        transform: Transform,
        content: NodeContent,
    ) {
        tracing::trace!(id = %id.short(), kind = content.kind(), %label, "attach");
        self.nodes.insert(
            id,
            SceneNode {
                label,
                parent,
                transform,
                content,
            },
        );
    }

    /// Remove a node and all of its descendants. Returns the removed node.
    pub fn detach(&mut self, id: NodeId) -> Option<SceneNode> {
        let node = self.nodes.remove(&id)?;
        let mut orphans: Vec<NodeId> = self.children(id).collect();
        let mut descendants = 0usize;
        while let Some(child) = orphans.pop() {
            orphans.extend(self.children(child));
            if self.nodes.remove(&child).is_some() {
                descendants += 1;
            }
        }
        tracing::trace!(id = %id.short(), label = %node.label, descendants, "detach");
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(move |(_, n)| n.parent == Some(parent))
            .map(|(id, _)| *id)
    }

    /// First node carrying `label`, in id order.
    pub fn find(&self, label: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.label == label)
            .map(|(id, _)| *id)
    }

    /// Number of placed model subtrees (root model nodes).
    pub fn model_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| n.parent.is_none() && matches!(n.content, NodeContent::Model(_)))
            .count()
    }

    /// Number of nodes whose content is of the given kind.
    pub fn count_kind(&self, kind: &str) -> usize {
        self.nodes
            .values()
            .filter(|n| n.content.kind() == kind)
            .count()
    }

    /// Local-to-world matrix, composed up the parent chain.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Some(matrix)
    }

    pub fn waters_mut(&mut self) -> impl Iterator<Item = &mut WaterSurface> {
        self.nodes.values_mut().filter_map(|n| match &mut n.content {
            NodeContent::Water(w) => Some(w),
            _ => None,
        })
    }

    pub fn background(&self) -> Option<&TextureData> {
        self.background.as_ref()
    }

    pub fn set_background(&mut self, texture: TextureData) {
        self.background = Some(texture);
    }

    /// Texture used for image-based lighting.
    pub fn environment(&self) -> Option<&TextureData> {
        self.environment.as_ref()
    }

    pub fn set_environment(&mut self, texture: TextureData) {
        self.environment = Some(texture);
    }

    pub fn fog(&self) -> Option<&Fog> {
        self.fog.as_ref()
    }

    pub fn set_fog(&mut self, fog: Fog) {
        self.fog = Some(fog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Light, LightKind};
    use glam::Vec3;
    use momiji_assets::{ContentDigest, ModelData};
    use momiji_common::Rgb;
    use std::sync::Arc;

    fn model(name: &str) -> NodeContent {
        NodeContent::Model(Arc::new(ModelData {
            source: name.into(),
            meshes: vec![],
            materials: vec![],
            digest: ContentDigest::default(),
        }))
    }

    #[test]
    fn graph_starts_empty() {
        let g = SceneGraph::new();
        assert!(g.is_empty());
        assert_eq!(g.model_count(), 0);
        assert!(g.fog().is_none());
    }

    #[test]
    fn attach_and_detach_root() {
        let mut g = SceneGraph::new();
        let id = g.attach("bench", Transform::default(), model("bench.glb"));
        assert_eq!(g.model_count(), 1);
        assert_eq!(g.find("bench"), Some(id));

        let node = g.detach(id).unwrap();
        assert_eq!(node.label, "bench");
        assert!(g.is_empty());
        assert!(g.detach(id).is_none());
    }

    #[test]
    fn detach_removes_subtree() {
        let mut g = SceneGraph::new();
        let root = g.attach("tree", Transform::default(), model("tree.glb"));
        let leaf = g
            .attach_child(root, "leaf", Transform::default(), model("leaf.glb"))
            .unwrap();
        g.attach_child(leaf, "bud", Transform::default(), NodeContent::Group)
            .unwrap();
        let other = g.attach("bench", Transform::default(), model("bench.glb"));
        assert_eq!(g.len(), 4);
        assert_eq!(g.model_count(), 2);

        g.detach(root);
        assert_eq!(g.len(), 1);
        assert!(g.contains(other));
        assert!(g.find("leaf").is_none());
        assert!(g.find("bud").is_none());
    }

    #[test]
    fn attach_child_requires_parent() {
        let mut g = SceneGraph::new();
        assert!(g
            .attach_child(NodeId::new(), "orphan", Transform::default(), NodeContent::Group)
            .is_none());
        assert!(g.is_empty());
    }

    #[test]
    fn child_models_are_not_counted_as_subtrees() {
        let mut g = SceneGraph::new();
        let root = g.attach("base", Transform::default(), model("base.glb"));
        g.attach_child(root, "deco", Transform::default(), model("deco.glb"));
        assert_eq!(g.model_count(), 1);
        assert_eq!(g.count_kind("model"), 2);
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut g = SceneGraph::new();
        let root = g.attach(
            "root",
            Transform {
                position: Vec3::new(10.0, 0.0, 0.0),
                rotation: Vec3::ZERO,
                scale: Vec3::splat(2.0),
            },
            NodeContent::Group,
        );
        let child = g
            .attach_child(root, "child", Transform::at(Vec3::new(1.0, 0.0, 0.0)), NodeContent::Group)
            .unwrap();
        let p = g.world_matrix(child).unwrap().transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(12.0, 0.0, 0.0));
    }

    #[test]
    fn repeated_swaps_leave_no_residue() {
        let mut g = SceneGraph::new();
        g.attach("ambient", Transform::default(), NodeContent::Group);
        let mut text = g.attach("clock", Transform::default(), NodeContent::Group);
        for _ in 0..10_000 {
            g.detach(text);
            text = g.attach("clock", Transform::default(), NodeContent::Group);
        }
        assert_eq!(g.len(), 2);
        assert_eq!(g.find("clock"), Some(text));
    }

    #[test]
    fn children_of_a_group() {
        let mut g = SceneGraph::new();
        let a = g.attach(
            "ambient",
            Transform::default(),
            NodeContent::Light(Light::new(LightKind::Ambient, Rgb::WHITE, 1.0)),
        );
        let b = g.attach("group", Transform::default(), NodeContent::Group);
        let c = g
            .attach_child(b, "child", Transform::default(), NodeContent::Group)
            .unwrap();
        assert!(g.get(a).unwrap().parent.is_none());
        assert_eq!(g.get(c).unwrap().parent, Some(b));
        assert_eq!(g.children(b).collect::<Vec<_>>(), vec![c]);
    }
}
