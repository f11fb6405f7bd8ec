//! Builders for synthetic `DXBC` blobs and SM4 token streams.

use crate::FourCC;

/// Builds a `DXBC` container holding `chunks` in order.
///
/// The checksum is left zeroed; parsing never validates it.
pub fn build_container(chunks: &[(FourCC, &[u8])]) -> Vec<u8> {
    let header_size = 32 + 4 * chunks.len();
    let mut out = Vec::with_capacity(header_size);

    out.extend_from_slice(b"DXBC");
    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // total_size, patched below
    out.extend_from_slice(&(chunks.len() as u32).to_le_bytes());
    out.resize(header_size, 0);

    for (i, (fourcc, data)) in chunks.iter().enumerate() {
        let offset = out.len() as u32;
        out[32 + i * 4..36 + i * 4].copy_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&fourcc.0);
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }

    let total_size = out.len() as u32;
    out[24..28].copy_from_slice(&total_size.to_le_bytes());
    out
}

/// One entry for [`build_signature_chunk`].
#[derive(Debug, Clone)]
pub struct SignatureSpec {
    pub semantic_name: &'static str,
    pub semantic_index: u32,
    pub register: u32,
    pub mask: u8,
    pub component_type: u32,
    pub system_value_type: u32,
}

impl SignatureSpec {
    pub fn new(semantic_name: &'static str, semantic_index: u32, register: u32, mask: u8) -> Self {
        Self {
            semantic_name,
            semantic_index,
            register,
            mask,
            component_type: crate::signature::component_type::FLOAT32,
            system_value_type: 0,
        }
    }

    pub fn component_type(mut self, component_type: u32) -> Self {
        self.component_type = component_type;
        self
    }

    pub fn system_value(mut self, system_value_type: u32) -> Self {
        self.system_value_type = system_value_type;
        self
    }
}

/// Builds an `ISGN`/`OSGN` payload with 24-byte entries.
///
/// Semantic names follow the entry table with no trailing padding.
pub fn build_signature_chunk(entries: &[SignatureSpec]) -> Vec<u8> {
    let table_start = 8usize;
    let strings_start = table_start + entries.len() * 24;

    let mut table = Vec::new();
    let mut strings = Vec::new();
    for entry in entries {
        let name_offset = (strings_start + strings.len()) as u32;
        strings.extend_from_slice(entry.semantic_name.as_bytes());
        strings.push(0);

        for word in [
            name_offset,
            entry.semantic_index,
            entry.system_value_type,
            entry.component_type,
            entry.register,
            entry.mask as u32 | ((entry.mask as u32) << 8),
        ] {
            table.extend_from_slice(&word.to_le_bytes());
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    out.extend_from_slice(&(table_start as u32).to_le_bytes());
    out.extend_from_slice(&table);
    out.extend_from_slice(&strings);
    out
}

/// Token builders using the real D3D10/11 tokenized program encoding.
pub mod tokens {
    pub const SWIZZLE_XYZW: [u8; 4] = [0, 1, 2, 3];

    pub const TYPE_TEMP: u32 = 0;
    pub const TYPE_INPUT: u32 = 1;
    pub const TYPE_OUTPUT: u32 = 2;
    pub const TYPE_IMMEDIATE32: u32 = 4;
    pub const TYPE_SAMPLER: u32 = 6;
    pub const TYPE_RESOURCE: u32 = 7;
    pub const TYPE_CONSTANT_BUFFER: u32 = 8;

    fn encode_swizzle(swizzle: [u8; 4]) -> u32 {
        swizzle
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &c)| acc | ((c as u32 & 3) << (2 * i)))
    }

    /// A 1D-indexed destination with a write mask.
    pub fn dst(ty: u32, index: u32, mask: u8) -> Vec<u32> {
        vec![2 | ((mask as u32) << 4) | (ty << 12) | (1 << 20), index]
    }

    /// A 1D-indexed source with a swizzle.
    pub fn src(ty: u32, index: u32, swizzle: [u8; 4]) -> Vec<u32> {
        vec![2 | (1 << 2) | (encode_swizzle(swizzle) << 4) | (ty << 12) | (1 << 20), index]
    }

    /// A 1D-indexed source with a single selected component.
    pub fn src_scalar(ty: u32, index: u32, component: u8) -> Vec<u32> {
        vec![2 | (2 << 2) | ((component as u32 & 3) << 4) | (ty << 12) | (1 << 20), index]
    }

    /// `cb{slot}[{reg}]` with a swizzle.
    pub fn cb(slot: u32, reg: u32, swizzle: [u8; 4]) -> Vec<u32> {
        vec![
            2 | (1 << 2)
                | (encode_swizzle(swizzle) << 4)
                | (TYPE_CONSTANT_BUFFER << 12)
                | (2 << 20),
            slot,
            reg,
        ]
    }

    /// A four-component `l(...)` literal.
    pub fn imm_vec4(values: [f32; 4]) -> Vec<u32> {
        let mut out = vec![2 | (TYPE_IMMEDIATE32 << 12)];
        out.extend(values.iter().map(|v| v.to_bits()));
        out
    }

    /// `t{slot}` with identity swizzle.
    pub fn resource(slot: u32) -> Vec<u32> {
        src(TYPE_RESOURCE, slot, SWIZZLE_XYZW)
    }

    /// `s{slot}`.
    pub fn sampler(slot: u32) -> Vec<u32> {
        vec![(TYPE_SAMPLER << 12) | (1 << 20), slot]
    }

    /// Joins an opcode with its operands and patches in the length.
    pub fn inst(opcode: u32, operands: &[Vec<u32>]) -> Vec<u32> {
        let len = 1 + operands.iter().map(Vec::len).sum::<usize>();
        let mut out = vec![opcode | ((len as u32) << 24)];
        for operand in operands {
            out.extend_from_slice(operand);
        }
        out
    }

    /// Wraps a body in version and length tokens and returns the chunk bytes.
    ///
    /// `program_type` is 0 for pixel and 1 for vertex shaders.
    pub fn program_bytes(program_type: u16, major: u8, minor: u8, body: &[u32]) -> Vec<u8> {
        let version = ((program_type as u32) << 16) | ((major as u32) << 4) | minor as u32;
        let len = (body.len() + 2) as u32;
        std::iter::once(version)
            .chain(std::iter::once(len))
            .chain(body.iter().copied())
            .flat_map(u32::to_le_bytes)
            .collect()
    }
}
