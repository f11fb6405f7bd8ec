//! Named parameter layouts used to replace raw `cb#[#]`/`t#` register names.

use tracing::debug;

use crate::ir::ShaderIr;

/// Register-to-name bindings for one compiled program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingMetadata {
    pub constant_buffers: Vec<CbufferLayout>,
    pub textures: Vec<TextureBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbufferLayout {
    pub name: String,
    /// Bind point (`cb#`) of this buffer.
    pub slot: u32,
    pub members: Vec<CbufferMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbufferMember {
    pub name: String,
    /// Byte offset from the start of the buffer.
    pub offset: u32,
    pub kind: MemberKind,
    /// Element count; 0 for a non-array member.
    pub array_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Vector { components: u32 },
    Matrix { rows: u32, columns: u32 },
}

impl CbufferMember {
    /// Lanes used in each 16-byte register.
    fn width(&self) -> u32 {
        match self.kind {
            MemberKind::Vector { components } => components.max(1),
            MemberKind::Matrix { columns, .. } => columns.max(1),
        }
    }

    /// Number of 16-byte registers spanned.
    fn register_count(&self) -> u32 {
        let per_element = match self.kind {
            MemberKind::Vector { .. } => 1,
            MemberKind::Matrix { rows, .. } => rows.max(1),
        };
        per_element * self.array_size.max(1)
    }

    /// True when accesses need a `[row]` subscript.
    pub fn is_indexed(&self) -> bool {
        self.array_size > 0 || matches!(self.kind, MemberKind::Matrix { .. })
    }

    pub fn is_scalar(&self) -> bool {
        !self.is_indexed() && self.width() == 1
    }

    /// Locates the byte address inside this member as `(row, component)`.
    fn locate(&self, address: u32) -> Option<(u32, u8)> {
        let rel = address.checked_sub(self.offset)?;
        if self.is_indexed() {
            let (row, component) = (rel / 16, (rel % 16) / 4);
            (row < self.register_count() && component < self.width())
                .then_some((row, component as u8))
        } else {
            let component = rel / 4;
            (component < self.width()).then_some((0, component as u8))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    pub name: String,
    /// Bind point (`t#`) of this texture.
    pub slot: u32,
    /// Sampler bind point, or -1 when the texture has none.
    pub sampler_slot: i32,
    /// Texture dimension as stored in the parameter table.
    pub dimension: i32,
}

/// A constant-buffer access resolved to a single member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantAccess<'a> {
    pub member: &'a CbufferMember,
    /// Register within the member; only meaningful for indexed members.
    pub row: u32,
    /// Member-relative component of each requested lane.
    pub components: Vec<u8>,
}

impl BindingMetadata {
    pub fn is_empty(&self) -> bool {
        self.constant_buffers.is_empty() && self.textures.is_empty()
    }

    pub fn constant_buffer(&self, slot: u32) -> Option<&CbufferLayout> {
        self.constant_buffers.iter().find(|cb| cb.slot == slot)
    }

    /// Resolves the given lanes of `cb{slot}[reg]` to one member.
    ///
    /// Returns `None` when the buffer is unknown, a lane falls outside every
    /// member, or the lanes span more than one member or register.
    pub fn resolve_constant(&self, slot: u32, reg: u32, lanes: &[u8]) -> Option<ConstantAccess<'_>> {
        let cb = self.constant_buffer(slot)?;
        let mut found: Option<(&CbufferMember, u32)> = None;
        let mut components = Vec::with_capacity(lanes.len());

        for &lane in lanes {
            let address = reg.checked_mul(16)?.checked_add(4 * u32::from(lane))?;
            let (member, row, component) = cb
                .members
                .iter()
                .find_map(|m| m.locate(address).map(|(row, c)| (m, row, c)))?;
            match found {
                Some((prev, prev_row)) if !std::ptr::eq(prev, member) || prev_row != row => {
                    return None
                }
                _ => found = Some((member, row)),
            }
            components.push(component);
        }

        let (member, row) = found?;
        Some(ConstantAccess {
            member,
            row,
            components,
        })
    }

    pub fn texture(&self, slot: u32) -> Option<&TextureBinding> {
        self.textures.iter().find(|t| t.slot == slot)
    }
}

/// Returns a copy of `ir` whose register operands render with the names in `meta`.
pub fn apply_metadata(ir: &ShaderIr, meta: &BindingMetadata) -> ShaderIr {
    debug!(
        constant_buffers = meta.constant_buffers.len(),
        textures = meta.textures.len(),
        "applying binding metadata"
    );
    ShaderIr {
        bindings: Some(meta.clone()),
        ..ir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vector(name: &str, offset: u32, components: u32) -> CbufferMember {
        CbufferMember {
            name: name.to_owned(),
            offset,
            kind: MemberKind::Vector { components },
            array_size: 0,
        }
    }

    fn meta() -> BindingMetadata {
        BindingMetadata {
            constant_buffers: vec![CbufferLayout {
                name: "$Globals".to_owned(),
                slot: 0,
                members: vec![
                    vector("_Color", 0, 4),
                    vector("_Cutoff", 16, 1),
                    vector("_Tiling", 20, 2),
                    CbufferMember {
                        name: "_Matrix".to_owned(),
                        offset: 32,
                        kind: MemberKind::Matrix {
                            rows: 4,
                            columns: 4,
                        },
                        array_size: 0,
                    },
                ],
            }],
            textures: vec![TextureBinding {
                name: "_MainTex".to_owned(),
                slot: 0,
                sampler_slot: 2,
                dimension: 2,
            }],
        }
    }

    #[test]
    fn resolves_vector_lanes_relative_to_member() {
        let meta = meta();
        let access = meta.resolve_constant(0, 1, &[1, 2]).unwrap();
        assert_eq!(access.member.name, "_Tiling");
        assert_eq!(access.components, vec![0, 1]);
    }

    #[test]
    fn resolves_matrix_rows() {
        let meta = meta();
        let access = meta.resolve_constant(0, 4, &[0, 1, 2, 3]).unwrap();
        assert_eq!(access.member.name, "_Matrix");
        assert_eq!(access.row, 2);
        assert!(access.member.is_indexed());
    }

    #[test]
    fn lanes_spanning_members_stay_unresolved() {
        assert!(meta().resolve_constant(0, 1, &[0, 1]).is_none());
        assert!(meta().resolve_constant(3, 0, &[0]).is_none());
    }

    #[test]
    fn scalar_member() {
        let meta = meta();
        let access = meta.resolve_constant(0, 1, &[0]).unwrap();
        assert!(access.member.is_scalar());
    }

    #[test]
    fn textures_resolve_by_slot() {
        let meta = meta();
        assert_eq!(meta.texture(0).unwrap().name, "_MainTex");
        assert!(meta.texture(2).is_none());
    }
}
