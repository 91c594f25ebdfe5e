/// STL reader and writer for binary and ASCII formats
use std::{
    io::{self, Write},
    path::Path,
};

use nalgebra::{Point3, Vector3};
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take},
    character::complete::{line_ending, multispace0, multispace1, not_line_ending},
    combinator::{cut, eof, map},
    error::{context, VerboseError, VerboseErrorKind},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::{
    error::StlError,
    geometry::{Mesh, Triangle},
};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

type TextResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Detect and parse an STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, StlError> {
    if looks_like_ascii(data) {
        match std::str::from_utf8(data) {
            Ok(text) => match parse_ascii_stl(text) {
                Ok(mesh) => return Ok(mesh),
                Err(error) if binary_size_matches(data) => {
                    tracing::debug!(%error, "not ASCII after all, decoding as binary");
                }
                Err(error) => return Err(error),
            },
            Err(_) => {
                tracing::debug!("`solid` header on non UTF-8 data, decoding as binary");
            }
        }
    }

    parse_binary_stl(data)
}

/// Read and parse the STL file at `path`
pub fn load_stl(path: impl AsRef<Path>) -> Result<Mesh, StlError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| StlError::Io {
        source,
        path: path.to_owned(),
    })?;

    let mesh = parse_stl(&data)?;
    tracing::debug!(
        path = %path.display(),
        name = %mesh.name,
        triangles = mesh.len(),
        "loaded STL"
    );
    Ok(mesh)
}

fn looks_like_ascii(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    data[start..]
        .get(..5)
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case(b"solid"))
}

/// True when the length is exactly what the binary triangle count declares
fn binary_size_matches(data: &[u8]) -> bool {
    declared_triangles(data)
        .and_then(binary_len)
        .is_some_and(|expected| expected == data.len())
}

fn declared_triangles(data: &[u8]) -> Option<u32> {
    let bytes = data.get(HEADER_LEN..HEADER_LEN + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn binary_len(triangles: u32) -> Option<usize> {
    (triangles as usize)
        .checked_mul(FACET_LEN)?
        .checked_add(HEADER_LEN + 4)
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, StlError> {
    let Some(triangle_count) = declared_triangles(data) else {
        return Err(StlError::TooShort { len: data.len() });
    };

    let expected = binary_len(triangle_count).unwrap_or(usize::MAX);
    if data.len() < expected {
        return Err(StlError::Truncated {
            count: triangle_count,
            expected,
            actual: data.len(),
        });
    }

    let truncated = |_| StlError::Truncated {
        count: triangle_count,
        expected,
        actual: data.len(),
    };
    let (_, (header, _, triangles)) = tuple((
        take::<_, _, nom::error::Error<&[u8]>>(HEADER_LEN),
        le_u32,
        count(binary_facet, triangle_count as usize),
    ))(data)
    .map_err(truncated)?;

    Ok(Mesh {
        name: header_name(header),
        triangles,
    })
}

/// Mesh name from the 80-byte header: up to the first NUL, trimmed
fn header_name(header: &[u8]) -> String {
    let end = header.iter().position(|&b| b == 0).unwrap_or(header.len());
    String::from_utf8_lossy(&header[..end]).trim().to_owned()
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], Vector3<f32>> {
    map(tuple((le_f32, le_f32, le_f32)), |(x, y, z)| {
        Vector3::new(x, y, z)
    })(input)
}

fn binary_point(input: &[u8]) -> IResult<&[u8], Point3<f32>> {
    map(binary_vector, Point3::from)(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    // The trailing u16 is the attribute byte count, unused by nearly every exporter
    map(
        tuple((binary_vector, binary_point, binary_point, binary_point, le_u16)),
        |(normal, v1, v2, v3, _attributes)| Triangle::new(normal, v1, v2, v3),
    )(input)
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, StlError> {
    match ascii_solid(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(nom::Err::Error(error) | nom::Err::Failure(error)) => {
            Err(ascii_error(input, &error))
        }
        Err(nom::Err::Incomplete(_)) => Err(StlError::Ascii {
            line: input.lines().count().max(1),
            expected: "more input".to_owned(),
        }),
    }
}

fn ascii_error(input: &str, error: &VerboseError<&str>) -> StlError {
    let rest = error.errors.first().map_or(input, |(rest, _)| *rest);
    let offset = input.len() - rest.len();
    let line = input[..offset].matches('\n').count() + 1;

    let expected = error
        .errors
        .iter()
        .find_map(|(_, kind)| match kind {
            VerboseErrorKind::Context(context) => Some((*context).to_owned()),
            _ => None,
        })
        .or_else(|| error.errors.first().map(|(_, kind)| format!("{kind:?}")))
        .unwrap_or_else(|| "solid".to_owned());

    StlError::Ascii { line, expected }
}

fn ascii_solid(input: &str) -> TextResult<'_, Mesh> {
    let (input, _) = context("solid", keyword("solid"))(input)?;
    let (input, name) = not_line_ending(input)?;
    let (input, _) = alt((line_ending, eof))(input)?;
    let (input, triangles) = many0(ascii_facet)(input)?;
    let (input, _) = context("endsolid", keyword("endsolid"))(input)?;

    Ok((
        input,
        Mesh {
            name: name.trim().to_owned(),
            triangles,
        },
    ))
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> TextResult<'a, &'a str> {
    preceded(multispace0, tag_no_case(word))
}

fn ascii_facet(input: &str) -> TextResult<'_, Triangle> {
    let (input, _) = keyword("facet")(input)?;

    // Past `facet` every mismatch is a hard error instead of the end of the facet list
    cut(ascii_facet_body)(input)
}

fn ascii_facet_body(input: &str) -> TextResult<'_, Triangle> {
    let (input, _) = context("normal", preceded(multispace1, tag_no_case("normal")))(input)?;
    let (input, normal) = context("normal vector", ascii_vector)(input)?;
    let (input, _) = context("outer loop", keyword("outer"))(input)?;
    let (input, _) = context("outer loop", preceded(multispace1, tag_no_case("loop")))(input)?;
    let (input, v1) = ascii_vertex(input)?;
    let (input, v2) = ascii_vertex(input)?;
    let (input, v3) = ascii_vertex(input)?;
    let (input, _) = context("endloop", keyword("endloop"))(input)?;
    let (input, _) = context("endfacet", keyword("endfacet"))(input)?;

    Ok((input, Triangle::new(normal, v1, v2, v3)))
}

fn ascii_vertex(input: &str) -> TextResult<'_, Point3<f32>> {
    let (input, _) = context("vertex", keyword("vertex"))(input)?;
    let (input, position) = context("vertex coordinates", ascii_vector)(input)?;
    Ok((input, Point3::from(position)))
}

fn ascii_vector(input: &str) -> TextResult<'_, Vector3<f32>> {
    let (input, _) = multispace1(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

/// Write `mesh` in the binary layout; the name fills the 80-byte header
pub fn write_binary_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> io::Result<()> {
    let count = u32::try_from(mesh.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "too many triangles for binary STL")
    })?;

    let mut header = [0u8; HEADER_LEN];
    let name = mesh.name.as_bytes();
    let len = name.len().min(HEADER_LEN);
    header[..len].copy_from_slice(&name[..len]);

    writer.write_all(&header)?;
    writer.write_all(&count.to_le_bytes())?;

    for triangle in &mesh.triangles {
        let mut record = [0u8; FACET_LEN];
        let values = std::iter::once(&triangle.normal)
            .chain(triangle.vertices.iter().map(|v| &v.coords))
            .flat_map(|v| v.iter());
        for (chunk, value) in record.chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        // last two bytes stay zero: attribute byte count
        writer.write_all(&record)?;
    }

    Ok(())
}

/// Write `mesh` as ASCII STL using exponent notation for every float
pub fn write_ascii_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "solid {}", mesh.name)?;
    for triangle in &mesh.triangles {
        let n = &triangle.normal;
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for v in &triangle.vertices {
            writeln!(writer, "      vertex {:e} {:e} {:e}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {}", mesh.name)?;
    Ok(())
}
