//! OVF 2.0 frame reading and writing.
//!
//! Supports the `Binary 4` and `Text` data blocks of a single-segment
//! rectangular-mesh file, the format micromagnetic solvers emit one file
//! per saved time step.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use ndarray::Array4;

use crate::error::OvfError;

/// Leading value of a `Binary 4` data block; written little-endian and
/// checked on read to catch endianness and framing mistakes.
pub const OVF_CONTROL_NUMBER: f32 = 1234567.0;

/// One simulation frame: the field on a rectangular mesh plus its cell
/// sizes.
#[derive(Clone, Debug)]
pub struct OvfFrame {
    /// Field values in `(z, y, x, comp)` order.
    pub data: Array4<f32>,
    /// Cell sizes in meters: `(dx, dy, dz)`.
    pub cell_size: (f64, f64, f64),
}

enum DataFormat {
    Binary4,
    Text,
}

struct Header {
    nodes: (usize, usize, usize), // (x, y, z)
    steps: (f64, f64, f64),
    valuedim: usize,
    format: DataFormat,
    /// Byte offset of the first payload byte.
    data_start: usize,
}

/// Reads one OVF 2.0 frame.
pub fn read_ovf<P: AsRef<Path>>(path: P) -> Result<OvfFrame, OvfError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => OvfError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => OvfError::Io(e),
    })?;

    let header = parse_header(path, &bytes)?;
    let (x, y, z) = header.nodes;
    let count = x * y * z * header.valuedim;
    let payload = &bytes[header.data_start..];

    let values = match header.format {
        DataFormat::Binary4 => read_binary4(path, payload, count)?,
        DataFormat::Text => read_text(path, payload, count)?,
    };

    let data = Array4::from_shape_vec((z, y, x, header.valuedim), values).map_err(|_| {
        OvfError::TruncatedData {
            path: path.to_path_buf(),
        }
    })?;
    Ok(OvfFrame {
        data,
        cell_size: header.steps,
    })
}

fn parse_header(path: &Path, bytes: &[u8]) -> Result<Header, OvfError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let line_end = bytes[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| offset + p)
            .ok_or_else(|| OvfError::MalformedHeader {
                path: path.to_path_buf(),
                reason: "no data block".into(),
            })?;
        let line = String::from_utf8_lossy(&bytes[offset..line_end]);
        let line = line.trim();
        offset = line_end + 1;

        if let Some(rest) = line.strip_prefix("# Begin: Data") {
            let format = match rest.trim() {
                "Binary 4" => DataFormat::Binary4,
                "Text" => DataFormat::Text,
                other => {
                    return Err(OvfError::MalformedHeader {
                        path: path.to_path_buf(),
                        reason: format!("unsupported data format '{other}'"),
                    });
                }
            };
            return Ok(Header {
                nodes: (
                    field(path, &fields, "xnodes")?,
                    field(path, &fields, "ynodes")?,
                    field(path, &fields, "znodes")?,
                ),
                steps: (
                    field(path, &fields, "xstepsize")?,
                    field(path, &fields, "ystepsize")?,
                    field(path, &fields, "zstepsize")?,
                ),
                valuedim: field(path, &fields, "valuedim")?,
                format,
                data_start: offset,
            });
        }

        if let Some(body) = line.strip_prefix('#')
            && let Some((key, value)) = body.split_once(':')
        {
            fields.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    Err(OvfError::MalformedHeader {
        path: path.to_path_buf(),
        reason: "no data block".into(),
    })
}

fn field<T: std::str::FromStr>(
    path: &Path,
    fields: &HashMap<String, String>,
    name: &'static str,
) -> Result<T, OvfError> {
    let raw = fields.get(name).ok_or(OvfError::MissingField {
        path: path.to_path_buf(),
        field: name,
    })?;
    raw.parse().map_err(|_| OvfError::MalformedHeader {
        path: path.to_path_buf(),
        reason: format!("field '{name}' has unparsable value '{raw}'"),
    })
}

fn read_binary4(path: &Path, payload: &[u8], count: usize) -> Result<Vec<f32>, OvfError> {
    let need = (count + 1) * 4;
    if payload.len() < need {
        return Err(OvfError::TruncatedData {
            path: path.to_path_buf(),
        });
    }
    let control = le_f32(&payload[0..4]);
    if control != OVF_CONTROL_NUMBER {
        return Err(OvfError::BadControlNumber {
            path: path.to_path_buf(),
            got: control,
        });
    }
    Ok(payload[4..need].chunks_exact(4).map(le_f32).collect())
}

fn read_text(path: &Path, payload: &[u8], count: usize) -> Result<Vec<f32>, OvfError> {
    let text = String::from_utf8_lossy(payload);
    let mut values = Vec::with_capacity(count);
    for line in text.lines() {
        if line.starts_with('#') {
            break;
        }
        for token in line.split_whitespace() {
            let v = token.parse().map_err(|_| OvfError::MalformedHeader {
                path: path.to_path_buf(),
                reason: format!("non-numeric data token '{token}'"),
            })?;
            values.push(v);
            if values.len() == count {
                return Ok(values);
            }
        }
    }
    Err(OvfError::TruncatedData {
        path: path.to_path_buf(),
    })
}

fn le_f32(bytes: &[u8]) -> f32 {
    f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Writes one frame as an OVF 2.0 `Binary 4` file.
pub fn write_ovf<P: AsRef<Path>>(path: P, frame: &OvfFrame) -> Result<(), OvfError> {
    let path: PathBuf = path.as_ref().to_path_buf();
    let (z, y, x, c) = frame.data.dim();
    let (dx, dy, dz) = frame.cell_size;

    let mut w = std::io::BufWriter::new(std::fs::File::create(&path)?);
    writeln!(w, "# OOMMF OVF 2.0")?;
    writeln!(w, "# Segment count: 1")?;
    writeln!(w, "# Begin: Segment")?;
    writeln!(w, "# Begin: Header")?;
    writeln!(w, "# meshtype: rectangular")?;
    writeln!(w, "# meshunit: m")?;
    writeln!(w, "# xnodes: {x}")?;
    writeln!(w, "# ynodes: {y}")?;
    writeln!(w, "# znodes: {z}")?;
    writeln!(w, "# xstepsize: {dx}")?;
    writeln!(w, "# ystepsize: {dy}")?;
    writeln!(w, "# zstepsize: {dz}")?;
    writeln!(w, "# valuedim: {c}")?;
    writeln!(w, "# End: Header")?;
    writeln!(w, "# Begin: Data Binary 4")?;
    w.write_all(&OVF_CONTROL_NUMBER.to_le_bytes())?;
    // Logical (z, y, x, comp) order, x varying faster than y than z.
    for &v in frame.data.iter() {
        w.write_all(&v.to_le_bytes())?;
    }
    writeln!(w)?;
    writeln!(w, "# End: Data Binary 4")?;
    writeln!(w, "# End: Segment")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;
    use tempfile::TempDir;

    fn sample_frame() -> OvfFrame {
        let data = Array4::from_shape_fn((2, 3, 4, 3), |(z, y, x, c)| {
            (((z * 3 + y) * 4 + x) * 3 + c) as f32
        });
        OvfFrame {
            data,
            cell_size: (1e-9, 2e-9, 3e-9),
        }
    }

    #[test]
    fn binary_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m000000.ovf");
        let frame = sample_frame();
        write_ovf(&path, &frame).unwrap();

        let back = read_ovf(&path).unwrap();
        assert_eq!(back.data, frame.data);
        assert_eq!(back.cell_size, frame.cell_size);
    }

    #[test]
    fn text_block_is_parsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.ovf");
        let body = "\
# OOMMF OVF 2.0
# Begin: Header
# xnodes: 2
# ynodes: 1
# znodes: 1
# xstepsize: 1e-9
# ystepsize: 1e-9
# zstepsize: 1e-9
# valuedim: 3
# End: Header
# Begin: Data Text
1 2 3
4 5 6
# End: Data Text
";
        std::fs::write(&path, body).unwrap();
        let frame = read_ovf(&path).unwrap();
        assert_eq!(frame.data.dim(), (1, 1, 2, 3));
        assert_eq!(frame.data[[0, 0, 0, 0]], 1.0);
        assert_eq!(frame.data[[0, 0, 1, 2]], 6.0);
    }

    #[test]
    fn missing_file_and_missing_field() {
        let dir = TempDir::new().unwrap();
        let err = read_ovf(dir.path().join("absent.ovf")).unwrap_err();
        assert!(matches!(err, OvfError::FileNotFound { .. }));

        let path = dir.path().join("bad.ovf");
        std::fs::write(&path, "# xnodes: 4\n# Begin: Data Binary 4\n").unwrap();
        let err = read_ovf(&path).unwrap_err();
        assert!(matches!(err, OvfError::MissingField { field: "ynodes", .. }));
    }

    #[test]
    fn corrupt_control_number_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.ovf");
        let frame = sample_frame();
        write_ovf(&path, &frame).unwrap();

        // Flip one byte of the control number.
        let mut bytes = std::fs::read(&path).unwrap();
        let data_tag = b"# Begin: Data Binary 4\n";
        let pos = bytes
            .windows(data_tag.len())
            .position(|w| w == data_tag)
            .unwrap()
            + data_tag.len();
        bytes[pos] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();

        let err = read_ovf(&path).unwrap_err();
        assert!(matches!(err, OvfError::BadControlNumber { .. }));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.ovf");
        write_ovf(&path, &sample_frame()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 40]).unwrap();
        let err = read_ovf(&path).unwrap_err();
        assert!(matches!(err, OvfError::TruncatedData { .. }));
    }
}
