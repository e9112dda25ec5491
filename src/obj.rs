//! Colored-OBJ mesh loading.
//!
//! This module defines the CPU-side [`Mesh`] and the loader for the extended
//! OBJ dialect this tool consumes: `v` lines carry three position fields
//! followed by three color fields, and `f` lines reference exactly three
//! vertices (1-based). Everything else in the file is ignored.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use glam::Vec3;
use glow::HasContext;

/// A single mesh vertex: position plus an unnormalized RGB color.
///
/// Color fields pass through exactly as written in the file; no 0-1 or 0-255
/// convention is assumed.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Vec3,
}

impl crate::abs::Vertex for Vertex {
    fn vertex_attribs(gl: &glow::Context) {
        unsafe {
            let stride = std::mem::size_of::<Vertex>() as i32;

            // Position attribute
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);

            // Color attribute
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(
                1,
                3,
                glow::FLOAT,
                false,
                stride,
                size_of::<Vec3>() as i32,
            );
        }
    }
}

/// Vertex and index data for a triangle mesh.
///
/// Indices are zero-based and flattened (three per triangle). Every index is
/// validated against the vertex count at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Errors reported while reading a mesh from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("{}: {source}", path.display())]
    Parse { path: PathBuf, source: ParseError },
}

/// Errors in the mesh text itself.
///
/// Malformed *float* fields on `v` lines are not an error: they fall back to
/// `0.0`, matching the zero-fill behavior expected of this format. Face
/// references are stricter because they are used as array indices.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: face has {found} vertex references, expected 3")]
    FaceArity { line: usize, found: usize },
    #[error("line {line}: face index `{field}` is not a positive integer")]
    BadFaceIndex { line: usize, field: String },
    #[error("line {line}: face references vertex {index} but the file defines {vertex_count}")]
    IndexOutOfRange {
        line: usize,
        index: u32,
        vertex_count: usize,
    },
}

impl Mesh {
    /// Reads a mesh from the file at `path`.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(BufReader::new(file)).map_err(|e| match e {
            ReadOrParse::Read(source) => LoadError::Read {
                path: path.to_path_buf(),
                source,
            },
            ReadOrParse::Parse(source) => LoadError::Parse {
                path: path.to_path_buf(),
                source,
            },
        })
    }

    /// Parses mesh text from any buffered reader.
    ///
    /// Lines are examined by their first whitespace-separated token: `v`
    /// appends a vertex, `f` appends a triangle, anything else is skipped.
    fn parse<R: BufRead>(reader: R) -> Result<Self, ReadOrParse> {
        let mut vertices = Vec::new();
        // Faces are kept with their source line until the whole file is read,
        // so forward references to later vertices still pass the bounds check.
        let mut faces: Vec<(usize, [u32; 3])> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(ReadOrParse::Read)?;
            let line_no = idx + 1;
            let mut fields = line.split_whitespace();
            match fields.next() {
                Some("v") => {
                    let mut coords = [0.0f32; 6];
                    for (slot, field) in coords.iter_mut().zip(&mut fields) {
                        *slot = field.parse().unwrap_or(0.0);
                    }
                    vertices.push(Vertex {
                        position: Vec3::new(coords[0], coords[1], coords[2]),
                        color: Vec3::new(coords[3], coords[4], coords[5]),
                    });
                }
                Some("f") => {
                    let mut refs = [0u32; 3];
                    let mut found = 0;
                    for (slot, field) in refs.iter_mut().zip(&mut fields) {
                        let one_based: u32 = field.parse().ok().filter(|&n| n > 0).ok_or_else(
                            || {
                                ReadOrParse::Parse(ParseError::BadFaceIndex {
                                    line: line_no,
                                    field: field.to_string(),
                                })
                            },
                        )?;
                        *slot = one_based - 1;
                        found += 1;
                    }
                    if found != 3 {
                        return Err(ReadOrParse::Parse(ParseError::FaceArity {
                            line: line_no,
                            found,
                        }));
                    }
                    faces.push((line_no, refs));
                }
                _ => {}
            }
        }

        let mut indices = Vec::with_capacity(faces.len() * 3);
        for (line, refs) in faces {
            for index in refs {
                if index as usize >= vertices.len() {
                    return Err(ReadOrParse::Parse(ParseError::IndexOutOfRange {
                        line,
                        index,
                        vertex_count: vertices.len(),
                    }));
                }
                indices.push(index);
            }
        }

        Ok(Self { vertices, indices })
    }

    /// Number of triangles described by the index list.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

enum ReadOrParse {
    Read(io::Error),
    Parse(ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<Mesh, ParseError> {
        Mesh::parse(Cursor::new(text)).map_err(|e| match e {
            ReadOrParse::Parse(e) => e,
            ReadOrParse::Read(e) => panic!("unexpected read error: {e}"),
        })
    }

    #[test]
    fn test_degenerate_single_vertex_face() {
        let mesh = parse("v 1.0 2.0 3.0 0.5 0.5 0.5\nf 1 1 1\n").unwrap();
        assert_eq!(mesh.vertices.len(), 1);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.indices, vec![0, 0, 0]);
        assert_eq!(mesh.vertices[0].position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.vertices[0].color, Vec3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_one_based_conversion() {
        let mesh = parse(
            "v 0 0 0 1 0 0\n\
             v 1 0 0 0 1 0\n\
             v 0 1 0 0 0 1\n\
             f 3 1 2\n",
        )
        .unwrap();
        assert_eq!(mesh.indices, vec![2, 0, 1]);
    }

    #[test]
    fn test_counts() {
        let mut text = String::new();
        for i in 0..7 {
            text.push_str(&format!("v {i} 0 0 0 0 0\n"));
        }
        for _ in 0..4 {
            text.push_str("f 1 2 3\n");
        }
        let mesh = parse(&text).unwrap();
        assert_eq!(mesh.vertices.len(), 7);
        assert_eq!(mesh.indices.len(), 3 * 4);
    }

    #[test]
    fn test_unrecognized_lines_skipped() {
        let mesh = parse(
            "# comment\n\
             vn 0 1 0\n\
             v 0 0 0 1 1 1\n\
             \n\
             usemtl none\n\
             f 1 1 1\n",
        )
        .unwrap();
        assert_eq!(mesh.vertices.len(), 1);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_malformed_floats_zero_fill() {
        let mesh = parse("v 1.0 oops 3.0 0.25\nf 1 1 1\n").unwrap();
        assert_eq!(mesh.vertices[0].position, Vec3::new(1.0, 0.0, 3.0));
        assert_eq!(mesh.vertices[0].color, Vec3::new(0.25, 0.0, 0.0));
    }

    #[test]
    fn test_index_out_of_range_rejected() {
        let err = parse("v 0 0 0 0 0 0\nf 1 2 1\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::IndexOutOfRange {
                line: 2,
                index: 1,
                vertex_count: 1,
            }
        );
    }

    #[test]
    fn test_forward_reference_ok() {
        // Faces may reference vertices defined later in the file.
        let mesh = parse("f 1 2 3\nv 0 0 0 0 0 0\nv 1 0 0 0 0 0\nv 0 1 0 0 0 0\n").unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_zero_index_rejected() {
        // The format is 1-based; `0` has no zero-based counterpart.
        let err = parse("v 0 0 0 0 0 0\nf 0 1 1\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::BadFaceIndex {
                line: 2,
                field: "0".to_string(),
            }
        );
    }

    #[test]
    fn test_short_face_rejected() {
        let err = parse("v 0 0 0 0 0 0\nf 1 1\n").unwrap_err();
        assert_eq!(err, ParseError::FaceArity { line: 2, found: 2 });
    }

    #[test]
    fn test_quad_face_takes_first_three() {
        let mesh = parse(
            "v 0 0 0 0 0 0\nv 1 0 0 0 0 0\nv 1 1 0 0 0 0\nv 0 1 0 0 0 0\nf 1 2 3 4\n",
        )
        .unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_nonexistent_path() {
        let err = Mesh::load(Path::new("/no/such/mesh.obj")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }
}
