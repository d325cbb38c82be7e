/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Vector3, Vector4};
use std::io::Write;
use toycity_core::projection::clip_to_screen;
use toycity_core::{Camera, DrawCommand, Mesh, Renderer, Surface};

/// Character ramps per surface, darkest to lightest
const FACADE_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];
const GRASS_RAMP: &[char] = &['.', ',', ';', '"', 'v', 'w', 'W'];
const ASPHALT_RAMP: &[char] = &['.', '_', '-', '=', '#'];

/// Light shining down and slightly from the front-right
fn light_direction() -> Vector3<f32> {
    Vector3::new(0.4, 1.0, 0.6).normalize()
}

const AMBIENT: f32 = 0.25;

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: f32 = 0.5;

/// How a mesh should look on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    /// Linear RGB in `[0, 1]`
    pub tint: Vector3<f32>,
    pub surface: Surface,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            tint: Vector3::new(0.0, 0.9, 0.9),
            surface: Surface::Facade,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    glyph: char,
    color: Color,
}

const BLANK: Cell = Cell {
    glyph: ' ',
    color: Color::Reset,
};

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![BLANK; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Aspect ratio a camera should use to fill this renderer
    pub fn aspect(&self) -> f32 {
        self.width as f32 * CELL_ASPECT / self.height.max(1) as f32
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(BLANK);
    }

    pub fn glyph_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x].glyph)
    }

    /// Number of cells covered by geometry
    pub fn covered(&self) -> usize {
        self.cells.iter().filter(|c| c.glyph != ' ').count()
    }

    pub fn render_mesh(&mut self, mesh: &Mesh, model: &Matrix4<f32>, camera: &Camera, style: &Style) {
        let view_projection = camera.view_projection();
        for triangle in &mesh.triangles {
            let world = triangle.transformed(model);
            let Some(normal) = world.normal() else {
                continue;
            };
            // Back-face culling
            if normal.dot(&(camera.position - world.vertices[0])) <= 0.0 {
                continue;
            }

            let brightness = AMBIENT + (1.0 - AMBIENT) * normal.dot(&light_direction()).max(0.0);
            let cell = shade(style, brightness);

            let clip = world.vertices.map(|v| view_projection * v.to_homogeneous());
            let polygon = clip_near(&clip);
            if polygon.len() < 3 {
                continue;
            }
            let screen: Vec<_> = polygon
                .iter()
                .map(|c| clip_to_screen(c, self.width as u32, self.height as u32))
                .collect();
            for i in 1..screen.len() - 1 {
                self.rasterize_triangle(&[screen[0], screen[i], screen[i + 1]], cell);
            }
        }
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], cell: Cell) {
        let [v0, v1, v2] = *coords;

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py)) else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.cells[idx] = cell;
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (y, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            writer.queue(MoveTo(0, y as u16))?;
            for cell in row {
                writer.queue(SetForegroundColor(cell.color))?;
                writer.queue(Print(cell.glyph))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn shade(style: &Style, brightness: f32) -> Cell {
    let ramp = match style.surface {
        Surface::Grass => GRASS_RAMP,
        Surface::Asphalt => ASPHALT_RAMP,
        Surface::Facade => FACADE_RAMP,
    };
    let brightness = brightness.clamp(0.0, 1.0);
    let index = ((brightness * (ramp.len() - 1) as f32).round() as usize).min(ramp.len() - 1);
    let channel = |c: f32| ((c * brightness).clamp(0.0, 1.0) * 255.0).round() as u8;
    Cell {
        glyph: ramp[index],
        color: Color::Rgb {
            r: channel(style.tint.x),
            g: channel(style.tint.y),
            b: channel(style.tint.z),
        },
    }
}

/// Clip a clip-space triangle against the near plane (`z >= -w`).
///
/// Returns a convex polygon of zero, three or four corners.
fn clip_near(triangle: &[Vector4<f32>; 3]) -> Vec<Vector4<f32>> {
    let distance = |v: &Vector4<f32>| v.z + v.w;
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let current = triangle[i];
        let next = triangle[(i + 1) % 3];
        let (dc, dn) = (distance(&current), distance(&next));
        if dc >= 0.0 {
            out.push(current);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            let t = dc / (dc - dn);
            out.push(current + (next - current) * t);
        }
    }
    out
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

/// Draws scene-graph entities as tinted blocks
pub struct SceneRenderer<'a> {
    pub target: &'a mut AsciiRenderer,
    pub mesh: &'a Mesh,
    pub camera: &'a Camera,
}

impl Renderer for SceneRenderer<'_> {
    fn draw(&mut self, command: &DrawCommand) {
        let style = Style {
            tint: command.color,
            surface: command.surface,
        };
        self.target.render_mesh(self.mesh, &command.world, self.camera, &style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use toycity_core::{City, RotationState, Transform};

    fn camera_for(renderer: &AsciiRenderer) -> Camera {
        Camera::looking_at(Point3::new(0.0, 0.0, 5.0), Point3::origin(), renderer.aspect())
    }

    #[test]
    fn test_cube_covers_center() {
        let mut renderer = AsciiRenderer::new(60, 30);
        let camera = camera_for(&renderer);
        let model = Transform::rotation_matrix(&RotationState::new(0.3, 0.3, 0.0));
        renderer.render_mesh(&Mesh::cube(2.0), &model, &camera, &Style::default());

        assert_ne!(renderer.glyph_at(30, 15), Some(' '));
        assert_eq!(renderer.glyph_at(0, 0), Some(' '));
        assert!(renderer.covered() > 0);

        renderer.clear();
        assert_eq!(renderer.covered(), 0);
    }

    #[test]
    fn test_geometry_behind_camera_is_not_drawn() {
        let mut renderer = AsciiRenderer::new(40, 20);
        let camera = camera_for(&renderer);
        let behind = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 20.0));
        renderer.render_mesh(&Mesh::cube(1.0), &behind, &camera, &Style::default());
        assert_eq!(renderer.covered(), 0);
    }

    #[test]
    fn test_near_clipping_keeps_visible_part() {
        let inside = Vector4::new(0.0, 0.0, 0.0, 1.0);
        let behind = Vector4::new(0.0, 0.0, -3.0, 1.0);
        assert_eq!(clip_near(&[inside, inside, inside]).len(), 3);
        assert_eq!(clip_near(&[inside, inside, behind]).len(), 4);
        assert_eq!(clip_near(&[inside, behind, behind]).len(), 3);
        assert!(clip_near(&[behind, behind, behind]).is_empty());
    }

    #[test]
    fn test_shade_uses_surface_ramp() {
        let grass = Style {
            tint: Vector3::new(0.2, 0.4, 1.0),
            surface: Surface::Grass,
        };
        assert_eq!(shade(&grass, 1.0).glyph, *GRASS_RAMP.last().unwrap());
        assert_eq!(shade(&grass, 0.0).glyph, GRASS_RAMP[0]);
        assert_eq!(
            shade(&grass, 1.0).color,
            Color::Rgb { r: 51, g: 102, b: 255 }
        );
    }

    #[test]
    fn test_city_renders_through_scene_graph() {
        let mut city = City::planned();
        city.update();

        let mut target = AsciiRenderer::new(80, 24);
        let camera = Camera {
            far: 200.0,
            ..Camera::looking_at(Point3::new(0.0, 3.0, 15.0), Point3::new(0.0, 3.0, 0.0), target.aspect())
        };
        let block = City::block_mesh();
        let mut scene = SceneRenderer {
            target: &mut target,
            mesh: &block,
            camera: &camera,
        };
        assert_eq!(city.render(&mut scene), 3);
        // The ground fills the bottom of the view, even though it extends behind the camera.
        assert_ne!(target.glyph_at(40, 23), Some(' '));
    }
}
