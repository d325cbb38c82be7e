/// Hierarchical scene graph with top-down world transform propagation
///
/// Nodes live in an arena owned by [`SceneGraph`] and refer to their children
/// by [`NodeId`]. A node's world transform is only meaningful after
/// [`SceneGraph::update`] has run on a root above it.
use std::collections::HashSet;

use log::{debug, warn};
use nalgebra::Matrix4;

use crate::entity::{Entity, Placement};
use crate::render::{DrawCommand, Renderer};

/// Stable handle to a node inside one [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node carries besides its transforms
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodePayload {
    /// Pure grouping node, never drawn
    #[default]
    Group,
    Entity(Entity),
}

#[derive(Debug, Clone)]
pub struct Node {
    local: Matrix4<f32>,
    world: Matrix4<f32>,
    children: Vec<NodeId>,
    payload: NodePayload,
}

impl Node {
    fn new(local: Matrix4<f32>, payload: NodePayload) -> Self {
        Self {
            local,
            world: Matrix4::identity(),
            children: Vec::new(),
            payload,
        }
    }

    pub fn local_transform(&self) -> &Matrix4<f32> {
        &self.local
    }

    /// Placement in root space as of the last update pass
    pub fn world_transform(&self) -> &Matrix4<f32> {
        &self.world
    }

    /// Children in traversal order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn entity(&self) -> Option<&Entity> {
        match &self.payload {
            NodePayload::Entity(entity) => Some(entity),
            NodePayload::Group => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
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

    /// Add a grouping node with the given local transform
    pub fn add_node(&mut self, local: Matrix4<f32>) -> NodeId {
        self.push(Node::new(local, NodePayload::Group))
    }

    /// Add an entity node whose local transform comes from its placement
    pub fn add_entity(&mut self, entity: Entity) -> NodeId {
        let local = entity.local_transform();
        self.push(Node::new(local, NodePayload::Entity(entity)))
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Append `child` to `parent`'s children.
    ///
    /// `None`, ids from another graph and links that would make the graph
    /// cyclic are ignored. Returns whether the link was made.
    pub fn add_child(&mut self, parent: NodeId, child: Option<NodeId>) -> bool {
        let Some(child) = child else {
            debug!("ignoring empty child for node {}", parent.0);
            return false;
        };
        if !self.contains(parent) || !self.contains(child) {
            warn!("ignoring link {} -> {}: unknown node", parent.0, child.0);
            return false;
        }
        if self.reaches(child, parent) {
            warn!("ignoring link {} -> {}: would create a cycle", parent.0, child.0);
            return false;
        }
        self.nodes[parent.0].children.push(child);
        true
    }

    /// Whether `target` is `from` or one of its descendants
    fn reaches(&self, from: NodeId, target: NodeId) -> bool {
        if from == target {
            return true;
        }
        if self.nodes[from.0].children.is_empty() {
            return false;
        }
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if seen.insert(id) {
                stack.extend(self.nodes[id.0].children.iter().copied());
            }
        }
        false
    }

    pub fn local_transform(&self, id: NodeId) -> Option<&Matrix4<f32>> {
        self.node(id).map(Node::local_transform)
    }

    pub fn world_transform(&self, id: NodeId) -> Option<&Matrix4<f32>> {
        self.node(id).map(Node::world_transform)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or_default()
    }

    /// Replace a node's local transform. Takes effect on the next update.
    ///
    /// An entity keeps its old [`Placement`]; the node's transform is the one drawn.
    pub fn set_local_transform(&mut self, id: NodeId, local: Matrix4<f32>) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) => {
                node.local = local;
                true
            }
            None => false,
        }
    }

    /// Move an entity node, keeping its placement and local transform in step.
    ///
    /// Returns `false` for unknown ids and group nodes.
    pub fn set_placement(&mut self, id: NodeId, placement: Placement) -> bool {
        let Some(node) = self.nodes.get_mut(id.0) else {
            return false;
        };
        let NodePayload::Entity(entity) = &mut node.payload else {
            return false;
        };
        node.local = placement.local_transform();
        entity.set_placement(placement);
        true
    }

    /// Recompute world transforms below `root`, treating it as a scene root.
    ///
    /// Returns the number of nodes visited.
    pub fn update(&mut self, root: NodeId) -> usize {
        self.update_with_parent(root, &Matrix4::identity())
    }

    /// Recompute world transforms below `root` as if its parent sat at `parent_world`.
    ///
    /// Depth-first pre-order: every node is assigned after its parent and
    /// before any of its own descendants. Returns the number of nodes visited.
    pub fn update_with_parent(&mut self, root: NodeId, parent_world: &Matrix4<f32>) -> usize {
        let order = self.pre_order(root);
        for &(id, parent) in &order {
            let parent = parent.map_or(*parent_world, |p| self.nodes[p.0].world);
            let node = &mut self.nodes[id.0];
            node.world = parent * node.local;
        }
        order.len()
    }

    /// Pre-order walk of `root`'s subtree, in the order `update` visits it
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        self.pre_order(root).into_iter().map(|(id, _)| id).collect()
    }

    /// Each visit paired with the parent it was reached through.
    ///
    /// A node with several parents appears once per parent.
    fn pre_order(&self, root: NodeId) -> Vec<(NodeId, Option<NodeId>)> {
        let mut order = Vec::new();
        if !self.contains(root) {
            return order;
        }
        let mut stack = vec![(root, None)];
        while let Some((id, parent)) = stack.pop() {
            order.push((id, parent));
            // Reversed so siblings pop in insertion order.
            stack.extend(self.nodes[id.0].children.iter().rev().map(|&child| (child, Some(id))));
        }
        order
    }

    /// Draw commands for every entity in `root`'s subtree, in traversal order
    pub fn draw_commands(&self, root: NodeId) -> Vec<DrawCommand> {
        self.descendants(root)
            .into_iter()
            .filter_map(|id| {
                let node = &self.nodes[id.0];
                node.entity().map(|entity| DrawCommand {
                    node: id,
                    world: node.world,
                    category: entity.category(),
                    color: entity.color(),
                    surface: entity.surface(),
                })
            })
            .collect()
    }

    /// Hand every entity below `root` to `renderer`. Returns the draw count.
    pub fn submit<R: Renderer>(&self, root: NodeId, renderer: &mut R) -> usize {
        let commands = self.draw_commands(root);
        for command in &commands {
            renderer.draw(command);
        }
        commands.len()
    }
}
