/// Interface to whatever actually puts pixels on a screen
use nalgebra::Matrix4;

use crate::entity::{Category, Color, Surface};
use crate::scene::NodeId;

/// One draw of the shared entity geometry
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub node: NodeId,
    pub world: Matrix4<f32>,
    pub category: Option<Category>,
    pub color: Color,
    pub surface: Surface,
}

/// Consumes world transforms produced by the scene graph.
///
/// Implementations own all device state; nothing in this crate talks to a
/// graphics API.
pub trait Renderer {
    fn draw(&mut self, command: &DrawCommand);
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn draw(&mut self, command: &DrawCommand) {
        (**self).draw(command);
    }
}

/// Renderer that keeps every command it receives
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub commands: Vec<DrawCommand>,
}

impl Renderer for RecordingRenderer {
    fn draw(&mut self, command: &DrawCommand) {
        self.commands.push(command.clone());
    }
}
