/// The planned-city scene
use nalgebra::{Matrix4, Vector3};

use crate::entity::{Category, Entity, Placement};
use crate::geometry::Mesh;
use crate::render::Renderer;
use crate::scene::{NodeId, SceneGraph};

/// A scene graph plus the root every frame updates from
#[derive(Debug, Clone)]
pub struct City {
    pub graph: SceneGraph,
    pub root: NodeId,
}

impl City {
    /// An empty city: just a root at the origin
    pub fn new() -> Self {
        let mut graph = SceneGraph::new();
        let root = graph.add_node(Matrix4::identity());
        Self { graph, root }
    }

    /// Ground, a road across it and one skyscraper
    pub fn planned() -> Self {
        let mut city = Self::new();
        city.place(Vector3::new(0.0, -1.0, 0.0), Vector3::new(50.0, 0.2, 50.0), Category::Field);
        city.place(Vector3::new(0.0, -0.9, 0.0), Vector3::new(40.0, 0.1, 6.0), Category::Road);
        city.place(Vector3::new(5.0, 0.0, -5.0), Vector3::new(4.0, 20.0, 4.0), Category::Skyscraper);
        city
    }

    /// Add an entity directly under the root
    pub fn place(&mut self, position: Vector3<f32>, scale: Vector3<f32>, category: Category) -> NodeId {
        let id = self.graph.add_entity(Entity::new(Placement::new(position, scale), category));
        self.graph.add_child(self.root, Some(id));
        id
    }

    /// Recompute world transforms for the frame. Returns the node count visited.
    pub fn update(&mut self) -> usize {
        self.graph.update(self.root)
    }

    /// Draw every entity with the shared unit block
    pub fn render<R: Renderer>(&self, renderer: &mut R) -> usize {
        self.graph.submit(self.root, renderer)
    }

    /// Geometry every entity is drawn with
    pub fn block_mesh() -> Mesh {
        Mesh::cube(1.0)
    }
}

impl Default for City {
    fn default() -> Self {
        Self::new()
    }
}
