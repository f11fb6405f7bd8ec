//! Parsers for DXBC signature chunks (`ISGN`, `OSGN` and their variants).
//!
//! Signature chunks map shader input/output registers to semantics.

use crate::fourcc::FourCC;
use crate::DxbcError;

const SIGNATURE_HEADER_LEN: usize = 8;

/// A parsed DXBC signature chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureChunk {
    /// Parsed signature entries in chunk order.
    pub entries: Vec<SignatureEntry>,
}

/// A single entry in a DXBC signature chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEntry {
    /// The semantic name (e.g. `"POSITION"` or `"TEXCOORD"`).
    pub semantic_name: String,
    /// The semantic index (e.g. `1` for `TEXCOORD1`).
    pub semantic_index: u32,
    /// Register index assigned by the compiler.
    pub register: u32,
    /// System value type (`D3D_NAME`).
    pub system_value_type: u32,
    /// Register component type (`D3D_REGISTER_COMPONENT_TYPE`).
    pub component_type: u32,
    /// Components present in the register.
    pub mask: u8,
    /// Components actually read (inputs) or never written (outputs).
    pub read_write_mask: u8,
    /// Geometry shader stream, if the layout carries one.
    pub stream: Option<u32>,
}

/// Component type values stored in [`SignatureEntry::component_type`].
pub mod component_type {
    /// `D3D_REGISTER_COMPONENT_UINT32`
    pub const UINT32: u32 = 1;
    /// `D3D_REGISTER_COMPONENT_SINT32`
    pub const SINT32: u32 = 2;
    /// `D3D_REGISTER_COMPONENT_FLOAT32`
    pub const FLOAT32: u32 = 3;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum EntryLayout {
    /// `ISGN`/`OSGN`: 24-byte entries.
    Basic,
    /// `OSG5`: stream-prefixed 28-byte entries.
    Stream,
    /// `ISG1`/`OSG1`: stream-prefixed 32-byte entries with min precision.
    StreamMinPrecision,
}

impl EntryLayout {
    fn for_fourcc(fourcc: FourCC) -> Self {
        match fourcc {
            FourCC::OSG5 => Self::Stream,
            FourCC::ISG1 | FourCC::OSG1 => Self::StreamMinPrecision,
            _ => Self::Basic,
        }
    }

    fn entry_len(self) -> usize {
        match self {
            Self::Basic => 24,
            Self::Stream => 28,
            Self::StreamMinPrecision => 32,
        }
    }
}

/// Parses an `ISGN`/`OSGN` chunk payload (24-byte entries).
pub fn parse_signature_chunk(bytes: &[u8]) -> Result<SignatureChunk, DxbcError> {
    parse_with_layout(EntryLayout::Basic, bytes)
}

pub(crate) fn parse_signature_chunk_for_fourcc(
    fourcc: FourCC,
    bytes: &[u8],
) -> Result<SignatureChunk, DxbcError> {
    parse_with_layout(EntryLayout::for_fourcc(fourcc), bytes)
}

fn parse_with_layout(layout: EntryLayout, bytes: &[u8]) -> Result<SignatureChunk, DxbcError> {
    if bytes.len() < SIGNATURE_HEADER_LEN {
        return Err(DxbcError::invalid_chunk(format!(
            "signature chunk is truncated: need {SIGNATURE_HEADER_LEN} bytes for header, got {}",
            bytes.len()
        )));
    }

    let param_count = read_u32_le(bytes, 0, "param_count")? as usize;
    let param_offset = read_u32_le(bytes, 4, "param_offset")? as usize;
    if param_count == 0 {
        return Ok(SignatureChunk::default());
    }
    if param_offset < SIGNATURE_HEADER_LEN {
        return Err(DxbcError::invalid_chunk(format!(
            "param_offset {param_offset} points into signature header"
        )));
    }

    let entry_len = layout.entry_len();
    let table_end = param_count
        .checked_mul(entry_len)
        .and_then(|len| len.checked_add(param_offset))
        .ok_or_else(|| DxbcError::invalid_chunk("signature table size overflows"))?;
    if table_end > bytes.len() {
        return Err(DxbcError::invalid_chunk(format!(
            "signature table at {param_offset}..{table_end} is outside chunk length {}",
            bytes.len()
        )));
    }

    let mut entries = Vec::new();
    entries.try_reserve_exact(param_count).map_err(|_| {
        DxbcError::invalid_chunk(format!("signature entry count {param_count} is too large"))
    })?;

    for entry_index in 0..param_count {
        let mut at = param_offset + entry_index * entry_len;
        let stream = match layout {
            EntryLayout::Basic => None,
            EntryLayout::Stream | EntryLayout::StreamMinPrecision => {
                let stream = read_u32_le(bytes, at, "stream")?;
                at += 4;
                Some(stream)
            }
        };

        let name_offset = read_u32_le(bytes, at, "semantic_name_offset")? as usize;
        let semantic_index = read_u32_le(bytes, at + 4, "semantic_index")?;
        let system_value_type = read_u32_le(bytes, at + 8, "system_value_type")?;
        let component_type = read_u32_le(bytes, at + 12, "component_type")?;
        let register = read_u32_le(bytes, at + 16, "register")?;
        let packed = read_u32_le(bytes, at + 20, "mask")?;

        if (param_offset..table_end).contains(&name_offset) {
            return Err(DxbcError::invalid_chunk(format!(
                "entry {entry_index} semantic name offset {name_offset} points into the entry table"
            )));
        }
        let semantic_name = read_cstring(bytes, name_offset)
            .map_err(|e| {
                DxbcError::invalid_chunk(format!("entry {entry_index} semantic_name: {}", e.context()))
            })?
            .to_owned();

        // Basic entries pack the stream into the third byte of the mask dword.
        let stream = stream.or_else(|| Some((packed >> 16) & 0xFF));

        entries.push(SignatureEntry {
            semantic_name,
            semantic_index,
            register,
            system_value_type,
            component_type,
            mask: (packed & 0xFF) as u8,
            read_write_mask: ((packed >> 8) & 0xFF) as u8,
            stream,
        });
    }

    Ok(SignatureChunk { entries })
}

fn read_u32_le(bytes: &[u8], offset: usize, what: &str) -> Result<u32, DxbcError> {
    let slice = offset
        .checked_add(4)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| {
            DxbcError::invalid_chunk(format!(
                "need 4 bytes for {what} at {offset}, but chunk length is {}",
                bytes.len()
            ))
        })?;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn read_cstring(bytes: &[u8], offset: usize) -> Result<&str, DxbcError> {
    let tail = bytes.get(offset..).ok_or_else(|| {
        DxbcError::invalid_chunk(format!(
            "offset {offset} is outside chunk length {}",
            bytes.len()
        ))
    })?;
    let nul = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| DxbcError::invalid_chunk(format!("string at {offset} is not terminated")))?;
    core::str::from_utf8(&tail[..nul])
        .map_err(|_| DxbcError::invalid_chunk(format!("string at {offset} is not valid UTF-8")))
}
