/// Wavefront OBJ parsing, fan triangulation and flattening into draw buffers
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, trace};
use nalgebra::{Point3, Vector2, Vector3};
use nom::{
    bytes::complete::{tag, take_till1},
    character::complete::{i64 as index, space0, space1},
    combinator::{eof, opt, verify},
    multi::many0,
    number::complete::float,
    sequence::{preceded, terminated},
    IResult,
};
use thiserror::Error;

/// Vertex attribute a face corner can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::Position => "position",
            Attribute::TexCoord => "texture coordinate",
            Attribute::Normal => "normal",
        })
    }
}

#[derive(Error, Debug)]
pub enum ObjError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: malformed {record} record `{content}`")]
    Parse {
        line: usize,
        record: String,
        content: String,
    },

    #[error("line {line}: face has {corners} corners, at least 3 are required")]
    DegenerateFace { line: usize, corners: usize },

    #[error("line {line}: malformed face index 0 (indices start at 1)")]
    ZeroIndex { line: usize },

    #[error("line {line}: {attribute} index {index} out of range, {len} defined")]
    IndexOutOfRange {
        line: usize,
        attribute: Attribute,
        index: i64,
        len: usize,
    },

    #[error("mesh emits more vertices than a 32-bit index buffer can address")]
    TooManyVertices,
}

/// One polygon corner, already converted to 0-based indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCorner {
    pub position: usize,
    pub tex_coord: Option<usize>,
    pub normal: Option<usize>,
}

/// A polygon with three or more corners
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// 1-based source line
    pub line: usize,
    pub corners: Vec<FaceCorner>,
}

/// Attribute arrays and faces exactly as read from the file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjData {
    pub positions: Vec<Point3<f32>>,
    pub tex_coords: Vec<Vector2<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub faces: Vec<Face>,
}

/// Flat, non-deduplicated vertex stream with its trivial index buffer.
///
/// Every triangle corner gets its own vertex, so `indices[i] == i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderBuffer {
    pub vertices: Vec<Point3<f32>>,
    pub indices: Vec<u32>,
}

impl RenderBuffer {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Everything a successful load produces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedMesh {
    pub data: ObjData,
    pub buffer: RenderBuffer,
}

/// Split a polygon into a triangle fan around its first corner.
///
/// Only correct for convex, planar polygons. Yields `corners - 2` triangles.
pub fn triangulate(face: &Face) -> impl Iterator<Item = [FaceCorner; 3]> + '_ {
    let corners = &face.corners;
    (1..corners.len().saturating_sub(1)).map(move |i| [corners[0], corners[i], corners[i + 1]])
}

impl ObjData {
    /// Emit one vertex per triangle corner, in face order.
    pub fn flatten(&self) -> Result<RenderBuffer, ObjError> {
        let mut buffer = RenderBuffer::default();
        for face in &self.faces {
            if face.corners.len() < 3 {
                return Err(ObjError::DegenerateFace {
                    line: face.line,
                    corners: face.corners.len(),
                });
            }
            for triangle in triangulate(face) {
                for corner in triangle {
                    let position = self.positions.get(corner.position).ok_or(ObjError::IndexOutOfRange {
                        line: face.line,
                        attribute: Attribute::Position,
                        index: corner.position as i64 + 1,
                        len: self.positions.len(),
                    })?;
                    let index = u32::try_from(buffer.vertices.len()).map_err(|_| ObjError::TooManyVertices)?;
                    buffer.vertices.push(*position);
                    buffer.indices.push(index);
                }
            }
        }
        Ok(buffer)
    }

    /// Check every face index against the final attribute counts
    fn validate(&self) -> Result<(), ObjError> {
        for face in &self.faces {
            for corner in &face.corners {
                check_range(face.line, Attribute::Position, Some(corner.position), self.positions.len())?;
                check_range(face.line, Attribute::TexCoord, corner.tex_coord, self.tex_coords.len())?;
                check_range(face.line, Attribute::Normal, corner.normal, self.normals.len())?;
            }
        }
        Ok(())
    }
}

fn check_range(line: usize, attribute: Attribute, index: Option<usize>, len: usize) -> Result<(), ObjError> {
    match index {
        Some(i) if i >= len => Err(ObjError::IndexOutOfRange {
            line,
            attribute,
            index: i as i64 + 1,
            len,
        }),
        _ => Ok(()),
    }
}

/// Parse OBJ text already in memory
pub fn parse_obj(source: &str) -> Result<ObjData, ObjError> {
    let mut parser = ObjParser::default();
    for (number, line) in source.lines().enumerate() {
        parser.feed(number + 1, line)?;
    }
    parser.finish()
}

/// Parse and flatten OBJ text from any buffered reader
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> Result<LoadedMesh, ObjError> {
    let mut parser = ObjParser::default();
    for (number, line) in reader.lines().enumerate() {
        parser.feed(number + 1, &line?)?;
    }
    let data = parser.finish()?;
    let buffer = data.flatten()?;
    Ok(LoadedMesh { data, buffer })
}

/// Load an OBJ file from disk
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<LoadedMesh, ObjError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mesh = load_obj_from_reader(BufReader::new(file))?;
    debug!(
        "loaded {}: {} positions, {} faces, {} triangles",
        path.display(),
        mesh.data.positions.len(),
        mesh.data.faces.len(),
        mesh.buffer.triangle_count()
    );
    Ok(mesh)
}

/// Face corner as written, before 1-based and relative indices are resolved
#[derive(Debug, Clone, Copy)]
struct RawCorner {
    position: i64,
    tex_coord: Option<i64>,
    normal: Option<i64>,
}

enum Record {
    Position(Point3<f32>),
    TexCoord(Vector2<f32>),
    Normal(Vector3<f32>),
    Face(Vec<RawCorner>),
    Other,
}

#[derive(Default)]
struct ObjParser {
    data: ObjData,
}

impl ObjParser {
    fn feed(&mut self, line: usize, text: &str) -> Result<(), ObjError> {
        let content = text.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            return Ok(());
        }

        let (_, record) = parse_record(content).map_err(|_| ObjError::Parse {
            line,
            record: content.split_whitespace().next().unwrap_or_default().to_string(),
            content: content.to_string(),
        })?;

        match record {
            Record::Position(p) => self.data.positions.push(p),
            Record::TexCoord(t) => self.data.tex_coords.push(t),
            Record::Normal(n) => self.data.normals.push(n),
            Record::Face(raw) => {
                if raw.len() < 3 {
                    return Err(ObjError::DegenerateFace { line, corners: raw.len() });
                }
                let corners = raw
                    .into_iter()
                    .map(|c| self.resolve(line, c))
                    .collect::<Result<Vec<_>, _>>()?;
                self.data.faces.push(Face { line, corners });
            }
            Record::Other => trace!("line {line}: skipping `{content}`"),
        }
        Ok(())
    }

    fn resolve(&self, line: usize, raw: RawCorner) -> Result<FaceCorner, ObjError> {
        let data = &self.data;
        Ok(FaceCorner {
            position: resolve_index(line, Attribute::Position, raw.position, data.positions.len())?,
            tex_coord: raw
                .tex_coord
                .map(|i| resolve_index(line, Attribute::TexCoord, i, data.tex_coords.len()))
                .transpose()?,
            normal: raw
                .normal
                .map(|i| resolve_index(line, Attribute::Normal, i, data.normals.len()))
                .transpose()?,
        })
    }

    fn finish(self) -> Result<ObjData, ObjError> {
        self.data.validate()?;
        Ok(self.data)
    }
}

/// 1-based indices count from the start, negative ones back from the last
/// element defined so far.
fn resolve_index(line: usize, attribute: Attribute, raw: i64, len: usize) -> Result<usize, ObjError> {
    match raw {
        0 => Err(ObjError::ZeroIndex { line }),
        i if i > 0 => usize::try_from(i - 1).map_err(|_| out_of_range(line, attribute, raw, len)),
        i => usize::try_from(len as i64 + i).map_err(|_| out_of_range(line, attribute, raw, len)),
    }
}

fn out_of_range(line: usize, attribute: Attribute, index: i64, len: usize) -> ObjError {
    ObjError::IndexOutOfRange {
        line,
        attribute,
        index,
        len,
    }
}

fn parse_record(input: &str) -> IResult<&str, Record> {
    let (rest, keyword) = take_till1(|c: char| c.is_whitespace())(input)?;
    match keyword {
        "v" => parse_position(rest),
        "vt" => parse_tex_coord(rest),
        "vn" => parse_normal(rest),
        "f" => parse_face(rest),
        _ => Ok(("", Record::Other)),
    }
}

/// A whitespace-led finite number; `nan` and `inf` are rejected
fn spaced_float(input: &str) -> IResult<&str, f32> {
    preceded(space1, verify(float, |value: &f32| value.is_finite()))(input)
}

/// Extra values (homogeneous w, vertex colors) are skipped, anything else fails
fn end_of_record(input: &str) -> IResult<&str, ()> {
    let (input, _) = many0(spaced_float)(input)?;
    let (input, _) = preceded(space0, eof)(input)?;
    Ok((input, ()))
}

fn parse_position(input: &str) -> IResult<&str, Record> {
    let (input, x) = spaced_float(input)?;
    let (input, y) = spaced_float(input)?;
    let (input, z) = spaced_float(input)?;
    let (input, _) = end_of_record(input)?;
    Ok((input, Record::Position(Point3::new(x, y, z))))
}

fn parse_tex_coord(input: &str) -> IResult<&str, Record> {
    let (input, u) = spaced_float(input)?;
    let (input, v) = opt(spaced_float)(input)?;
    let (input, _) = end_of_record(input)?;
    Ok((input, Record::TexCoord(Vector2::new(u, v.unwrap_or(0.0)))))
}

fn parse_normal(input: &str) -> IResult<&str, Record> {
    let (input, x) = spaced_float(input)?;
    let (input, y) = spaced_float(input)?;
    let (input, z) = spaced_float(input)?;
    let (input, _) = end_of_record(input)?;
    Ok((input, Record::Normal(Vector3::new(x, y, z))))
}

fn parse_face(input: &str) -> IResult<&str, Record> {
    let (input, corners) = terminated(many0(preceded(space1, parse_corner)), preceded(space0, eof))(input)?;
    Ok((input, Record::Face(corners)))
}

/// `p`, `p/t`, `p//n` or `p/t/n`
fn parse_corner(input: &str) -> IResult<&str, RawCorner> {
    let (input, position) = index(input)?;
    let (input, tex_coord) = opt(preceded(tag("/"), opt(index)))(input)?;
    let (input, normal) = match tex_coord {
        Some(_) => opt(preceded(tag("/"), index))(input)?,
        None => (input, None),
    };
    Ok((
        input,
        RawCorner {
            position,
            tex_coord: tex_coord.flatten(),
            normal,
        },
    ))
}
