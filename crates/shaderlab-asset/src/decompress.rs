//! Block decompression of sub-program blobs and the per-platform segment
//! walk that feeds the container decoder.

use tracing::debug;

use crate::asset::SegmentedBlob;
use crate::container::ShaderProgram;
use crate::error::{Result, ShaderError};
use crate::options::DecodeOptions;
use crate::reader::ByteCursor;

pub trait BlockDecompressor {
    /// Expands `compressed` into exactly `expected` bytes.
    fn decompress(&self, compressed: &[u8], expected: usize) -> Result<Vec<u8>>;

    /// Bytes of input a segment occupies in the blob.
    fn input_len(&self, compressed_len: usize, _expected: usize) -> usize {
        compressed_len
    }
}

/// LZ4 block format, as used for every shader blob.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4BlockDecompressor;

impl BlockDecompressor for Lz4BlockDecompressor {
    fn decompress(&self, compressed: &[u8], expected: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; expected];
        let written = lz4_flex::block::decompress_into(compressed, &mut out)?;
        if written != expected {
            return Err(ShaderError::SizeMismatch {
                expected,
                actual: written,
            });
        }
        Ok(out)
    }
}

/// Segments stored without compression; `expected` bytes are copied from
/// the segment offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct UncompressedCopy;

impl BlockDecompressor for UncompressedCopy {
    fn decompress(&self, compressed: &[u8], expected: usize) -> Result<Vec<u8>> {
        compressed
            .get(..expected)
            .map(<[u8]>::to_vec)
            .ok_or(ShaderError::Truncated {
                expected,
                actual: compressed.len(),
            })
    }

    fn input_len(&self, _compressed_len: usize, expected: usize) -> usize {
        expected
    }
}

/// Decompressor matching how the asset stores its segments.
pub fn decompressor_for(options: &DecodeOptions) -> &'static dyn BlockDecompressor {
    if options.segments_uncompressed {
        &UncompressedCopy
    } else {
        &Lz4BlockDecompressor
    }
}

/// Decodes a pre-segment single blob; every entry lives in segment 0.
pub fn decode_legacy_blob(
    blob: &[u8],
    decompressed_size: usize,
    options: &DecodeOptions,
    decompressor: &dyn BlockDecompressor,
) -> Result<ShaderProgram> {
    let bytes = decompressor.decompress(blob, decompressed_size)?;
    let mut r = ByteCursor::new(&bytes);
    let mut program = ShaderProgram::read_index(&mut r, options)?;
    program.read_segment(&mut r, 0)?;
    Ok(program)
}

fn segment_input<'a>(blob: &'a [u8], offset: u32, len: usize) -> Result<&'a [u8]> {
    let start = offset as usize;
    start
        .checked_add(len)
        .and_then(|end| blob.get(start..end))
        .ok_or(ShaderError::Truncated {
            expected: len,
            actual: blob.len().saturating_sub(start),
        })
}

/// Decodes one [`ShaderProgram`] per platform. Segment 0 of each platform
/// starts with the entry index.
pub fn decode_segmented(
    blob: &SegmentedBlob,
    options: &DecodeOptions,
    decompressor: &dyn BlockDecompressor,
) -> Result<Vec<ShaderProgram>> {
    let mut programs = Vec::with_capacity(blob.platforms.len());
    for (i, platform) in blob.platforms.iter().enumerate() {
        let offsets = blob.offsets.get(i).map(Vec::as_slice).unwrap_or_default();
        let compressed = blob.compressed_lengths.get(i).map(Vec::as_slice).unwrap_or_default();
        let decompressed = blob.decompressed_lengths.get(i).map(Vec::as_slice).unwrap_or_default();

        let mut program = ShaderProgram::default();
        for (j, ((&offset, &clen), &dlen)) in offsets.iter().zip(compressed).zip(decompressed).enumerate() {
            let expected = dlen as usize;
            let input_len = decompressor.input_len(clen as usize, expected);
            let input = segment_input(&blob.data, offset, input_len)?;
            let bytes = decompressor.decompress(input, expected)?;
            debug!(%platform, segment = j, len = bytes.len(), "decompressed segment");

            let mut r = ByteCursor::new(&bytes);
            if j == 0 {
                program = ShaderProgram::read_index(&mut r, options)?;
            }
            program.read_segment(&mut r, j as i32)?;
        }
        programs.push(program);
    }
    Ok(programs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lz4_round_trip_checks_size() {
        let raw = b"abcabcabcabcabcabcabcabc".to_vec();
        let packed = lz4_flex::block::compress(&raw);
        assert_eq!(Lz4BlockDecompressor.decompress(&packed, raw.len()).unwrap(), raw);
        assert!(Lz4BlockDecompressor.decompress(&packed, raw.len() + 5).is_err());
    }

    #[test]
    fn short_output_is_a_size_mismatch() {
        let raw = [7u8; 10];
        let packed = lz4_flex::block::compress(&raw);
        let err = Lz4BlockDecompressor.decompress(&packed, 16).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::SizeMismatch {
                expected: 16,
                actual: 10
            }
        ));
    }

    #[test]
    fn uncompressed_copy_needs_enough_bytes() {
        assert_eq!(UncompressedCopy.decompress(&[1, 2, 3, 4], 3).unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            UncompressedCopy.decompress(&[1, 2], 3),
            Err(ShaderError::Truncated {
                expected: 3,
                actual: 2
            })
        ));
        assert_eq!(UncompressedCopy.input_len(1, 9), 9);
    }

    #[test]
    fn segment_range_is_bounds_checked() {
        let blob = [0u8; 8];
        assert_eq!(segment_input(&blob, 2, 4).unwrap().len(), 4);
        assert!(segment_input(&blob, 6, 4).is_err());
        assert!(segment_input(&blob, 20, 1).is_err());
    }
}
