use std::io::{Read, Write};

use byteorder::ByteOrder;
use tracing::debug;

use super::header::DumpHeader;
use super::{DumpEndian, read_section};
use crate::error::Result;
use crate::field::FieldArray;

/// Reads the `comp*sx*sy*sz` samples that follow the header.
pub fn decode_payload<R: Read>(reader: &mut R, header: &DumpHeader) -> Result<FieldArray> {
    let count = header.sample_count()?;
    let len = header.payload_len()?;
    let bytes = read_section(reader, len, "payload")?;

    let mut samples = vec![0f32; count];
    DumpEndian::read_f32_into(&bytes, &mut samples);
    debug!(count, bytes = len, "decoded payload");

    let shape = header.shape().map(|d| d as usize);
    Ok(FieldArray::from_flat(shape, samples)?)
}

/// Writes every sample in flat row-major order. No shape information is written.
pub fn encode_payload<W: Write>(writer: &mut W, field: &FieldArray) -> Result<()> {
    let samples = field.samples();
    let mut bytes = vec![0u8; samples.len() * std::mem::size_of::<f32>()];
    DumpEndian::write_f32_into(samples, &mut bytes);
    writer.write_all(&bytes)?;
    debug!(count = samples.len(), bytes = bytes.len(), "encoded payload");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DumpError, FormatError};

    fn flat(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32).collect()
    }

    fn le_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_shape_fidelity() {
        let header = DumpHeader::new(3, [2, 2, 2]).unwrap();
        let bytes = le_bytes(&flat(24));
        let field = decode_payload(&mut bytes.as_slice(), &header).unwrap();

        assert_eq!(field.shape(), [3, 2, 2, 2]);
        assert_eq!(field.get(2, 0, 0, 0), Some(16.0));
        assert_eq!(field.get(1, 1, 0, 1), Some(8.0 + 4.0 + 1.0));
        assert_eq!(field.get(0, 0, 0, 1), Some(1.0));
        assert_eq!(field.get(3, 0, 0, 0), None);
    }

    #[test]
    fn test_truncated_payload() {
        let header = DumpHeader::new(1, [2, 2, 2]).unwrap();
        let bytes = le_bytes(&flat(7));
        match decode_payload(&mut bytes.as_slice(), &header) {
            Err(DumpError::Truncated { section, expected, found }) => {
                assert_eq!(section, "payload");
                assert_eq!(expected, 32);
                assert_eq!(found, 28);
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_dimensions_rejected() {
        let mut header = DumpHeader::new(1, [2, 2, 2]).unwrap();
        header.sy = 0;
        let mut empty: &[u8] = &[];
        assert!(matches!(
            decode_payload(&mut empty, &header),
            Err(DumpError::Format(FormatError::InvalidDimensions { sy: 0, .. }))
        ));
    }

    #[test]
    fn decode_stops_at_payload_end() {
        let header = DumpHeader::new(1, [1, 1, 2]).unwrap();
        let mut bytes = le_bytes(&[1.5, -2.0]);
        bytes.extend_from_slice(&[0xAA; 8]);
        let mut reader = bytes.as_slice();
        let field = decode_payload(&mut reader, &header).unwrap();
        assert_eq!(field.samples(), &[1.5, -2.0]);
        assert_eq!(reader, &[0xAA; 8]);
    }

    #[test]
    fn test_encode_payload_length_and_order() {
        let field = FieldArray::from_flat([2, 1, 1, 3], flat(6)).unwrap();
        let mut out = Vec::new();
        encode_payload(&mut out, &field).unwrap();
        assert_eq!(out.len(), 6 * 4);
        assert_eq!(out, le_bytes(&flat(6)));
    }
}
