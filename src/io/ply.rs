//! PLY format I/O for splat clouds.
//!
//! The on-disk layout is one `vertex` element per splat:
//!
//! ```text
//! property float x, y, z        position
//! property float radius         disc radius
//! property float nx, ny, nz     unit normal
//! property uchar red/green/blue sRGB color (float properties also accepted,
//!                               interpreted as linear)
//! ```
//!
//! Properties may appear in any order; unknown properties are skipped.

use crate::core::color::{linear_f32_to_srgb_u8, srgb_u8_to_linear_f32};
use crate::core::{Splat, SplatCloud};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nalgebra::Vector3;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors produced while loading splat data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid PLY format: {0}")]
    InvalidFormat(String),

    #[error("Missing required property: {0}")]
    MissingProperty(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PropType {
    Float,
    Uchar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BodyFormat {
    Ascii,
    BinaryLittleEndian,
}

struct Header {
    format: BodyFormat,
    count: usize,
    /// (type, name) per vertex property, in file order
    properties: Vec<(PropType, String)>,
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<Header, LoadError> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if line.trim() != "ply" {
        return Err(LoadError::InvalidFormat("missing 'ply' magic".into()));
    }

    let mut format = None;
    let mut count = None;
    let mut properties = Vec::new();
    let mut in_vertex_element = false;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(LoadError::InvalidFormat("unexpected EOF in header".into()));
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["end_header"] => break,
            ["comment", ..] | [] => {}
            ["format", fmt, _version] => {
                format = Some(match *fmt {
                    "ascii" => BodyFormat::Ascii,
                    "binary_little_endian" => BodyFormat::BinaryLittleEndian,
                    other => {
                        return Err(LoadError::InvalidFormat(format!(
                            "unsupported format '{}'",
                            other
                        )))
                    }
                });
            }
            ["element", "vertex", n] => {
                count = Some(n.parse::<usize>().map_err(|_| {
                    LoadError::InvalidFormat(format!("bad vertex count '{}'", n))
                })?);
                in_vertex_element = true;
            }
            ["element", ..] => {
                // Splat files carry only vertices; any further element
                // (faces, edges) is not ours to parse.
                in_vertex_element = false;
            }
            ["property", "list", ..] => {
                return Err(LoadError::InvalidFormat(
                    "list properties are not supported".into(),
                ));
            }
            ["property", ty, name] if in_vertex_element => {
                let ty = match *ty {
                    "float" | "float32" => PropType::Float,
                    "uchar" | "uint8" => PropType::Uchar,
                    other => {
                        return Err(LoadError::InvalidFormat(format!(
                            "unsupported property type '{}'",
                            other
                        )))
                    }
                };
                properties.push((ty, name.to_string()));
            }
            ["property", ..] => {}
            other => {
                return Err(LoadError::InvalidFormat(format!(
                    "unrecognized header line: {:?}",
                    other.join(" ")
                )))
            }
        }
    }

    Ok(Header {
        format: format
            .ok_or_else(|| LoadError::InvalidFormat("missing 'format' line".into()))?,
        count: count
            .ok_or_else(|| LoadError::InvalidFormat("missing vertex element".into()))?,
        properties,
    })
}

fn property_index(header: &Header, name: &str) -> Result<usize, LoadError> {
    header
        .properties
        .iter()
        .position(|(_, n)| n == name)
        .ok_or_else(|| LoadError::MissingProperty(name.to_string()))
}

/// Load a splat cloud from a PLY file.
pub fn load_ply(path: &Path) -> Result<SplatCloud, LoadError> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = parse_header(&mut reader)?;

    let ix = property_index(&header, "x")?;
    let iy = property_index(&header, "y")?;
    let iz = property_index(&header, "z")?;
    let ir = property_index(&header, "radius")?;
    let inx = property_index(&header, "nx")?;
    let iny = property_index(&header, "ny")?;
    let inz = property_index(&header, "nz")?;
    let ired = property_index(&header, "red")?;
    let igreen = property_index(&header, "green")?;
    let iblue = property_index(&header, "blue")?;

    let mut cloud = SplatCloud::new();
    let mut row = vec![0.0f32; header.properties.len()];
    let mut line = String::new();

    for i in 0..header.count {
        match header.format {
            BodyFormat::Ascii => {
                line.clear();
                if reader.read_line(&mut line)? == 0 {
                    return Err(LoadError::InvalidFormat(format!(
                        "expected {} vertices, file ends at {}",
                        header.count, i
                    )));
                }
                let mut tokens = line.split_whitespace();
                for (slot, (_ty, name)) in row.iter_mut().zip(&header.properties) {
                    let token = tokens.next().ok_or_else(|| {
                        LoadError::InvalidFormat(format!("vertex {} is missing '{}'", i, name))
                    })?;
                    *slot = token.parse().map_err(|_| {
                        LoadError::InvalidFormat(format!("bad value '{}' for '{}'", token, name))
                    })?;
                }
            }
            BodyFormat::BinaryLittleEndian => {
                for (slot, (ty, _)) in row.iter_mut().zip(&header.properties) {
                    *slot = match ty {
                        PropType::Float => reader.read_f32::<LittleEndian>()?,
                        PropType::Uchar => reader.read_u8()? as f32,
                    };
                }
            }
        }

        let color_channel = |idx: usize| -> f32 {
            match header.properties[idx].0 {
                PropType::Uchar => srgb_u8_to_linear_f32(row[idx].clamp(0.0, 255.0) as u8),
                PropType::Float => row[idx],
            }
        };

        cloud.push(Splat::new(
            Vector3::new(row[ix], row[iy], row[iz]),
            row[ir],
            Vector3::new(row[inx], row[iny], row[inz]),
            Vector3::new(color_channel(ired), color_channel(igreen), color_channel(iblue)),
        ));
    }

    Ok(cloud)
}

fn write_header(
    out: &mut impl Write,
    count: usize,
    format: BodyFormat,
) -> Result<(), LoadError> {
    writeln!(out, "ply")?;
    match format {
        BodyFormat::Ascii => writeln!(out, "format ascii 1.0")?,
        BodyFormat::BinaryLittleEndian => writeln!(out, "format binary_little_endian 1.0")?,
    }
    writeln!(out, "comment surfel-rs splat cloud")?;
    writeln!(out, "element vertex {}", count)?;
    for name in ["x", "y", "z", "radius", "nx", "ny", "nz"] {
        writeln!(out, "property float {}", name)?;
    }
    for name in ["red", "green", "blue"] {
        writeln!(out, "property uchar {}", name)?;
    }
    writeln!(out, "end_header")?;
    Ok(())
}

/// Save a splat cloud as ASCII PLY.
pub fn save_ply(cloud: &SplatCloud, path: &Path) -> Result<(), LoadError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_header(&mut out, cloud.len(), BodyFormat::Ascii)?;
    for s in cloud.as_slice() {
        writeln!(
            out,
            "{} {} {} {} {} {} {} {} {} {}",
            s.position.x,
            s.position.y,
            s.position.z,
            s.radius,
            s.normal.x,
            s.normal.y,
            s.normal.z,
            linear_f32_to_srgb_u8(s.color.x),
            linear_f32_to_srgb_u8(s.color.y),
            linear_f32_to_srgb_u8(s.color.z),
        )?;
    }
    Ok(())
}

/// Save a splat cloud as binary little-endian PLY.
pub fn save_ply_binary(cloud: &SplatCloud, path: &Path) -> Result<(), LoadError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_header(&mut out, cloud.len(), BodyFormat::BinaryLittleEndian)?;
    for s in cloud.as_slice() {
        for v in [
            s.position.x,
            s.position.y,
            s.position.z,
            s.radius,
            s.normal.x,
            s.normal.y,
            s.normal.z,
        ] {
            out.write_f32::<LittleEndian>(v)?;
        }
        for c in [s.color.x, s.color.y, s.color.z] {
            out.write_u8(linear_f32_to_srgb_u8(c))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_cloud() -> SplatCloud {
        SplatCloud::from_splats(vec![
            Splat::new(
                Vector3::new(0.5, -1.25, 2.0),
                0.125,
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(1.0, 0.0, 0.0),
            ),
            Splat::new(
                Vector3::new(-3.0, 0.0, 1.5),
                0.25,
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(0.0, 0.214, 1.0),
            ),
        ])
    }

    fn assert_clouds_close(a: &SplatCloud, b: &SplatCloud) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert_relative_eq!(x.position, y.position, epsilon = 1e-5);
            assert_relative_eq!(x.radius, y.radius, epsilon = 1e-5);
            assert_relative_eq!(x.normal, y.normal, epsilon = 1e-5);
            // Colors go through u8 sRGB quantization on disk.
            for c in 0..3 {
                assert!((x.color[c] - y.color[c]).abs() < 0.01);
            }
        }
    }

    #[test]
    fn test_ascii_roundtrip() {
        let path = std::env::temp_dir().join("surfel_rs_test_ascii.ply");
        let cloud = sample_cloud();
        save_ply(&cloud, &path).unwrap();
        let loaded = load_ply(&path).unwrap();
        assert_clouds_close(&cloud, &loaded);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_binary_roundtrip() {
        let path = std::env::temp_dir().join("surfel_rs_test_binary.ply");
        let cloud = sample_cloud();
        save_ply_binary(&cloud, &path).unwrap();
        let loaded = load_ply(&path).unwrap();
        assert_clouds_close(&cloud, &loaded);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_property_is_reported() {
        let path = std::env::temp_dir().join("surfel_rs_test_missing.ply");
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nend_header\n0 0 0\n",
        )
        .unwrap();
        match load_ply(&path) {
            Err(LoadError::MissingProperty(name)) => assert_eq!(name, "radius"),
            other => panic!("expected MissingProperty, got {:?}", other.map(|c| c.len())),
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let path = std::env::temp_dir().join("surfel_rs_test_magic.ply");
        std::fs::write(&path, "not a ply\n").unwrap();
        assert!(matches!(load_ply(&path), Err(LoadError::InvalidFormat(_))));
        let _ = std::fs::remove_file(&path);
    }
}
