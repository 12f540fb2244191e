/// Wavefront OBJ loader for the triangle-only subset the renderer consumes
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::debug;
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::tag,
    character::complete::{space0, space1, u32 as parse_u32},
    combinator::{eof, map, opt, verify},
    multi::many0,
    number::complete::float,
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::{Error, IndexKind, Result};
use crate::geometry::{Face, Mesh};

/// Size of the line buffer. One byte is reserved for the string terminator,
/// so the longest accepted line is `MAX_LINE_LEN - 1` bytes including `\n`.
pub const MAX_LINE_LEN: usize = 1000;

/// Load a mesh from an OBJ file on disk
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mesh = parse_obj(BufReader::new(file))?;
    debug!(
        "loaded {}: {} vertices, {} texture coordinates, {} faces",
        path.display(),
        mesh.vertices.len(),
        mesh.tex_coords.len(),
        mesh.faces.len()
    );
    Ok(mesh)
}

/// Parse OBJ text from any buffered reader.
///
/// Either the whole input is accepted and every face index is checked
/// against the vertex and texture coordinate lists, or an error is returned.
pub fn parse_obj<R: BufRead>(mut reader: R) -> Result<Mesh> {
    let mut mesh = Mesh::new();
    let mut buf = Vec::with_capacity(MAX_LINE_LEN);
    let mut line_no = 0;

    loop {
        buf.clear();
        let read = (&mut reader)
            .take(MAX_LINE_LEN as u64 - 1)
            .read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        line_no += 1;

        if read == MAX_LINE_LEN - 1 && buf.last() != Some(&b'\n') {
            return Err(Error::LineOverrun {
                line: line_no,
                max: MAX_LINE_LEN,
            });
        }

        let line = std::str::from_utf8(&buf)
            .map_err(|_| parse_error(line_no, "line is not valid UTF-8"))?;
        parse_line(line.trim_end_matches(['\n', '\r']), line_no, &mut mesh)?;
    }

    validate(&mesh)?;
    Ok(mesh)
}

fn parse_line(line: &str, line_no: usize, mesh: &mut Mesh) -> Result<()> {
    let line = line.trim_start();
    let keyword_end = line.find(char::is_whitespace).unwrap_or(line.len());
    let (keyword, rest) = line.split_at(keyword_end);

    match keyword {
        "" | "vn" | "g" | "s" => {}
        k if k.starts_with('#') => {}
        "v" => {
            let (_, vertex) =
                vertex(rest).map_err(|_| parse_error(line_no, "expected `v x y z`"))?;
            mesh.vertices.push(vertex);
        }
        "vt" => {
            let (_, coord) =
                tex_coord(rest).map_err(|_| parse_error(line_no, "expected `vt u v [w]`"))?;
            mesh.tex_coords.push(coord);
        }
        "f" => {
            let (_, groups) = face_groups(rest).map_err(|_| {
                parse_error(line_no, "expected face groups of the form `v/vt/vn`")
            })?;
            let [a, b, c] = groups.as_slice() else {
                return Err(parse_error(
                    line_no,
                    format!(
                        "face has {} vertices, only triangles are supported",
                        groups.len()
                    ),
                ));
            };
            mesh.faces.push(Face::new(
                [a[0], b[0], c[0]],
                [a[1], b[1], c[1]],
                [a[2], b[2], c[2]],
            ));
        }
        other => {
            return Err(parse_error(
                line_no,
                format!("unknown directive `{}`", other),
            ))
        }
    }

    Ok(())
}

fn parse_error(line: usize, reason: impl Into<String>) -> Error {
    Error::Parse {
        line,
        reason: reason.into(),
    }
}

fn validate(mesh: &Mesh) -> Result<()> {
    for (face_index, face) in mesh.faces.iter().enumerate() {
        let checks = [
            (IndexKind::Vertex, &face.vertex, mesh.vertices.len()),
            (IndexKind::Texture, &face.texture, mesh.tex_coords.len()),
        ];
        for (kind, indices, len) in checks {
            if let Some(&index) = indices.iter().find(|&&i| i >= len) {
                return Err(Error::IndexOutOfRange {
                    face: face_index,
                    kind,
                    index,
                    len,
                });
            }
        }
    }
    Ok(())
}

fn end_of_line(input: &str) -> IResult<&str, &str> {
    preceded(space0, eof)(input)
}

fn vertex(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, (x, y, z)) = tuple((
        preceded(space1, float),
        preceded(space1, float),
        preceded(space1, float),
    ))(input)?;
    // Optional w or per-vertex colors.
    let (input, _) = many0(preceded(space1, float))(input)?;
    let (input, _) = end_of_line(input)?;
    Ok((input, Point3::new(x, y, z)))
}

fn tex_coord(input: &str) -> IResult<&str, Vector3<f32>> {
    let (input, (u, v, w)) = tuple((
        preceded(space1, float),
        preceded(space1, float),
        opt(preceded(space1, float)),
    ))(input)?;
    let (input, _) = end_of_line(input)?;
    Ok((input, Vector3::new(u, v, w.unwrap_or(0.0))))
}

/// A 1-based OBJ index, returned 0-based
fn index(input: &str) -> IResult<&str, usize> {
    map(verify(parse_u32, |n: &u32| *n > 0), |n| n as usize - 1)(input)
}

fn face_group(input: &str) -> IResult<&str, [usize; 3]> {
    let (input, (v, t, n)) = tuple((
        index,
        preceded(tag("/"), index),
        preceded(tag("/"), index),
    ))(input)?;
    Ok((input, [v, t, n]))
}

fn face_groups(input: &str) -> IResult<&str, Vec<[usize; 3]>> {
    let (input, groups) = many0(preceded(space1, face_group))(input)?;
    let (input, _) = end_of_line(input)?;
    Ok((input, groups))
}
