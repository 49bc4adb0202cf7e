/// STL file parser for binary and ASCII formats
use std::fmt;
use std::path::Path;

use nalgebra::Point3;
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::opt,
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::geometry::Mesh;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

type Facet = [Point3<f32>; 3];

/// Failure to read or parse an STL file
#[derive(Debug)]
pub enum StlError {
    Io(std::io::Error),
    /// Shorter than the 84-byte binary header
    TooShort { len: usize },
    /// Binary body ends before the declared facet count
    Truncated { declared: usize, available: usize },
    Ascii(String),
}

impl fmt::Display for StlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StlError::Io(err) => write!(f, "failed to read STL file: {err}"),
            StlError::TooShort { len } => {
                write!(f, "{len} bytes is too small to be a valid STL")
            }
            StlError::Truncated {
                declared,
                available,
            } => write!(
                f,
                "STL declares {declared} facets but only {available} are present"
            ),
            StlError::Ascii(msg) => write!(f, "failed to parse ASCII STL: {msg}"),
        }
    }
}

impl std::error::Error for StlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StlError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StlError {
    fn from(err: std::io::Error) -> Self {
        StlError::Io(err)
    }
}

/// Parse a binary STL file
pub fn parse_binary_stl(name: &str, data: &[u8]) -> Result<Mesh, StlError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(StlError::TooShort { len: data.len() });
    }

    let (body, declared) = binary_header(data)
        .map_err(|_| StlError::TooShort { len: data.len() })?;
    let declared = declared as usize;
    let available = body.len() / FACET_LEN;
    if available < declared {
        return Err(StlError::Truncated {
            declared,
            available,
        });
    }

    let (_, facets) = count(binary_facet, declared)(body).map_err(|_| StlError::Truncated {
        declared,
        available,
    })?;
    Ok(Mesh::from_triangles(name, facets))
}

fn binary_header(input: &[u8]) -> IResult<&[u8], u32> {
    preceded(take(HEADER_LEN), le_u32)(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Facet> {
    // The stored normal is ignored, there is no lighting
    let (input, _normal) = binary_vector(input)?;
    let (input, a) = binary_vector(input)?;
    let (input, b) = binary_vector(input)?;
    let (input, c) = binary_vector(input)?;
    let (input, _attributes) = le_u16(input)?;
    Ok((input, [a, b, c]))
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], Point3<f32>> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Point3::new(x, y, z)))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(name: &str, input: &str) -> Result<Mesh, StlError> {
    match ascii_solid(input) {
        Ok((_, facets)) => Ok(Mesh::from_triangles(name, facets)),
        Err(e) => Err(StlError::Ascii(format!("{e:?}"))),
    }
}

fn ascii_solid(input: &str) -> IResult<&str, Vec<Facet>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = not_line_ending(input)?; // Optional name
    let (input, facets) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = opt(not_line_ending)(input)?;
    Ok((input, facets))
}

fn ascii_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = ascii_vector(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = ascii_vertex(input)?;
    let (input, b) = ascii_vertex(input)?;
    let (input, c) = ascii_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, [a, b, c]))
}

fn ascii_vertex(input: &str) -> IResult<&str, Point3<f32>> {
    preceded(preceded(multispace0, tag("vertex")), ascii_vector)(input)
}

fn ascii_vector(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, Point3::new(x, y, z)))
}

/// Detect and parse STL data (binary or ASCII)
pub fn parse_stl(name: &str, data: &[u8]) -> Result<Mesh, StlError> {
    // Binary files may also start with "solid", so fall back on failure
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(name, text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(name, data)
}

/// Read and parse an STL file, naming the mesh after the file stem
pub fn load_stl(path: impl AsRef<Path>) -> Result<Mesh, StlError> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stl".to_string());
    parse_stl(&name, &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TETRA_ASCII: &str = "solid tetra
  facet normal 0 0 -1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
  facet normal 0 -1 0
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 0 1
    endloop
  endfacet
endsolid tetra
";

    fn binary(facets: &[[[f32; 3]; 3]], declared: u32) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data.extend_from_slice(&declared.to_le_bytes());
        for facet in facets {
            data.extend_from_slice(&[0u8; 12]);
            for vertex in facet {
                for coord in vertex {
                    data.extend_from_slice(&coord.to_le_bytes());
                }
            }
            data.extend_from_slice(&0u16.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let data = binary(&[], 0);
        let mesh = parse_binary_stl("empty", &data).unwrap();
        assert_eq!(mesh.faces().len(), 0);
    }

    #[test]
    fn test_binary_facets_are_indexed() {
        let data = binary(
            &[
                [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            ],
            2,
        );
        let mesh = parse_stl("quad", &data).unwrap();
        assert_eq!(mesh.name, "quad");
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.faces().len(), 2);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_binary_truncated() {
        let mut data = binary(&[[[0.0; 3]; 3]], 3);
        data.truncate(data.len() - 1);
        assert!(matches!(
            parse_binary_stl("t", &data),
            Err(StlError::Truncated {
                declared: 3,
                available: 0
            })
        ));
        assert!(matches!(
            parse_binary_stl("t", &[0u8; 10]),
            Err(StlError::TooShort { len: 10 })
        ));
    }

    #[test]
    fn test_ascii_with_solid_name() {
        let mesh = parse_stl("tetra", TETRA_ASCII.as_bytes()).unwrap();
        assert_eq!(mesh.faces().len(), 2);
        assert_eq!(mesh.vertices().len(), 4);
    }

    #[test]
    fn test_malformed_ascii() {
        let result = parse_ascii_stl("bad", "solid bad\n facet normal 0 0\n");
        assert!(matches!(result, Err(StlError::Ascii(_))));
    }
}
