/// City entities: categorized, colored placements
use nalgebra::{Matrix4, Vector3};

use crate::transform::Transform;

/// Linear RGB, each channel in `[0, 1]`
pub type Color = Vector3<f32>;

/// Color given to entities that carry no category
pub fn neutral_color() -> Color {
    Color::new(1.0, 1.0, 1.0)
}

/// What an entity represents in the city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    House,
    Shop,
    Skyscraper,
    Tree,
    Field,
    Road,
    Car,
    Mountain,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::House,
        Category::Shop,
        Category::Skyscraper,
        Category::Tree,
        Category::Field,
        Category::Road,
        Category::Car,
        Category::Mountain,
    ];

    pub fn color(self) -> Color {
        match self {
            Category::House => Color::new(0.8, 0.5, 0.3),
            Category::Shop => Color::new(0.2, 0.8, 0.2),
            Category::Skyscraper => Color::new(0.5, 0.5, 0.8),
            Category::Tree => Color::new(0.0, 0.6, 0.0),
            Category::Field => Color::new(0.3, 0.7, 0.3),
            Category::Road => Color::new(0.15, 0.15, 0.17),
            Category::Car => Color::new(1.0, 0.0, 0.0),
            Category::Mountain => Color::new(0.4, 0.3, 0.25),
        }
    }

    pub fn surface(self) -> Surface {
        match self {
            Category::Field => Surface::Grass,
            Category::Road => Surface::Asphalt,
            _ => Surface::Facade,
        }
    }
}

/// Surface finish a renderer should use for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Grass,
    Asphalt,
    Facade,
}

/// Position and per-axis extent of an entity relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Placement {
    pub fn new(position: Vector3<f32>, scale: Vector3<f32>) -> Self {
        Self { position, scale }
    }

    pub fn local_transform(&self) -> Matrix4<f32> {
        Transform::placement_matrix(&self.position, &self.scale)
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::new(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0))
    }
}

/// A drawable city object.
///
/// The color is derived from the category when the entity is built with
/// [`Entity::new`]. `Entity::default()` has no category and is drawn with
/// [`neutral_color`].
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    category: Option<Category>,
    color: Color,
    placement: Placement,
}

impl Entity {
    pub fn new(placement: Placement, category: Category) -> Self {
        Self {
            category: Some(category),
            color: category.color(),
            placement,
        }
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn surface(&self) -> Surface {
        self.category.map_or(Surface::Facade, Category::surface)
    }

    /// The most recent placement given to this entity.
    ///
    /// Once the entity is in a [`SceneGraph`](crate::scene::SceneGraph) the
    /// node's local transform is what gets drawn; it only matches this
    /// placement until `set_local_transform` replaces it.
    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Local transform built from [`Entity::placement`]
    pub fn local_transform(&self) -> Matrix4<f32> {
        self.placement.local_transform()
    }

    pub(crate) fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self {
            category: None,
            color: neutral_color(),
            placement: Placement::default(),
        }
    }
}
