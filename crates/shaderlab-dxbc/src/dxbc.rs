use core::fmt::Write as _;
use core::ops::Range;

use crate::error::DxbcError;
use crate::fourcc::FourCC;
use crate::signature::{parse_signature_chunk_for_fourcc, SignatureChunk};

const DXBC_MAGIC: FourCC = FourCC(*b"DXBC");
// magic, 16-byte checksum, reserved word, total size, chunk count
const HEADER_LEN: usize = 32;
const MAX_CHUNKS: u32 = 4096;

/// The fixed header of a `DXBC` container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DxbcHeader {
    pub magic: FourCC,
    /// Stored as-is; never validated.
    pub checksum: [u8; 16],
    pub total_size: u32,
    pub chunk_count: u32,
}

/// One chunk of a container, borrowed from the input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DxbcChunk<'a> {
    pub fourcc: FourCC,
    pub data: &'a [u8],
}

/// A parsed `DXBC` container. Chunk bounds are checked once in
/// [`DxbcFile::parse`].
#[derive(Debug, Clone)]
pub struct DxbcFile<'a> {
    bytes: &'a [u8],
    header: DxbcHeader,
    chunks: Vec<(FourCC, Range<usize>)>,
}

impl<'a> DxbcFile<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DxbcError> {
        if bytes.len() < HEADER_LEN {
            return Err(DxbcError::malformed_header(format!(
                "need at least {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let magic = FourCC(word(bytes, 0)?.to_le_bytes());
        if magic != DXBC_MAGIC {
            return Err(DxbcError::malformed_header(format!("bad magic {magic:?}")));
        }
        let mut checksum = [0u8; 16];
        checksum.copy_from_slice(&bytes[4..20]);
        let total_size = word(bytes, 24)?;
        let chunk_count = word(bytes, 28)?;

        if chunk_count > MAX_CHUNKS {
            return Err(DxbcError::malformed_offsets(format!(
                "{chunk_count} chunks exceeds the limit of {MAX_CHUNKS}"
            )));
        }
        let total = total_size as usize;
        if total < HEADER_LEN || total > bytes.len() {
            return Err(DxbcError::out_of_bounds(format!(
                "total_size {total_size} outside {HEADER_LEN}..={}",
                bytes.len()
            )));
        }
        let bytes = &bytes[..total];

        let table_end = HEADER_LEN + 4 * chunk_count as usize;
        if table_end > total {
            return Err(DxbcError::malformed_offsets(format!(
                "chunk table ends at {table_end}, past total_size {total}"
            )));
        }

        let mut chunks = Vec::with_capacity(chunk_count as usize);
        for i in 0..chunk_count as usize {
            let offset = word(bytes, HEADER_LEN + 4 * i)? as usize;
            if offset < table_end {
                return Err(DxbcError::malformed_offsets(format!(
                    "chunk {i} at {offset} overlaps the header"
                )));
            }
            let fourcc = FourCC(word(bytes, offset)?.to_le_bytes());
            let len = word(bytes, offset + 4)? as usize;
            let start = offset + 8;
            let end = start
                .checked_add(len)
                .filter(|&end| end <= total)
                .ok_or_else(|| {
                    DxbcError::out_of_bounds(format!(
                        "chunk {i} ({fourcc}) of {len} bytes at {start} exceeds total_size {total}"
                    ))
                })?;
            chunks.push((fourcc, start..end));
        }

        Ok(Self {
            bytes,
            header: DxbcHeader {
                magic,
                checksum,
                total_size,
                chunk_count,
            },
            chunks,
        })
    }

    pub fn header(&self) -> &DxbcHeader {
        &self.header
    }

    /// Chunks in file order.
    pub fn chunks(&self) -> impl Iterator<Item = DxbcChunk<'a>> + '_ {
        let bytes = self.bytes;
        self.chunks.iter().map(move |(fourcc, range)| DxbcChunk {
            fourcc: *fourcc,
            data: &bytes[range.clone()],
        })
    }

    pub fn get_chunk(&self, fourcc: FourCC) -> Option<DxbcChunk<'a>> {
        self.chunks().find(|chunk| chunk.fourcc == fourcc)
    }

    /// First signature chunk of the given kind. `ISG1` stands in for `ISGN`
    /// and `OSG1`/`OSG5` for `OSGN` when the exact id is absent.
    pub fn get_signature(&self, kind: FourCC) -> Option<Result<SignatureChunk, DxbcError>> {
        let fallbacks: &[FourCC] = match kind {
            FourCC::ISGN => &[FourCC::ISG1],
            FourCC::OSGN => &[FourCC::OSG1, FourCC::OSG5],
            _ => &[],
        };
        let chunk = self
            .get_chunk(kind)
            .or_else(|| fallbacks.iter().find_map(|&id| self.get_chunk(id)))?;
        Some(
            parse_signature_chunk_for_fourcc(chunk.fourcc, chunk.data).map_err(|e| {
                DxbcError::invalid_chunk(format!("{} signature: {}", chunk.fourcc, e.context()))
            }),
        )
    }

    /// One line per chunk, for logging.
    pub fn debug_summary(&self) -> String {
        let mut out = format!("{} bytes, {} chunks", self.header.total_size, self.chunks.len());
        for chunk in self.chunks() {
            let _ = write!(out, " {}:{}", chunk.fourcc, chunk.data.len());
        }
        out
    }
}

fn word(bytes: &[u8], offset: usize) -> Result<u32, DxbcError> {
    offset
        .checked_add(4)
        .and_then(|end| bytes.get(offset..end))
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| {
            DxbcError::out_of_bounds(format!(
                "word at {offset} past end of {}-byte container",
                bytes.len()
            ))
        })
}
