//! Parsed shader object graph: properties, sub-shaders, passes and
//! render state, plus the compiled program blobs that accompany it.

use bitflags::bitflags;

use crate::platform::{ShaderCompilerPlatform, ShaderGpuProgramType};

/// Shader object as stored in an asset file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shader {
    pub parsed_form: ShaderAsset,
    /// Original script text, or the legacy script with `GpuProgramIndex`
    /// placeholders.
    pub script: Vec<u8>,
    /// Single LZ4 blob used before per-platform segments existed.
    pub sub_program_blob: Option<LegacyBlob>,
    pub compressed_blob: Option<SegmentedBlob>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyBlob {
    pub data: Vec<u8>,
    pub decompressed_size: u32,
}

/// Per-platform segment tables over one shared blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentedBlob {
    pub platforms: Vec<ShaderCompilerPlatform>,
    pub offsets: Vec<Vec<u32>>,
    pub compressed_lengths: Vec<Vec<u32>>,
    pub decompressed_lengths: Vec<Vec<u32>>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderAsset {
    pub name: String,
    pub properties: Vec<Property>,
    pub sub_shaders: Vec<SubShader>,
    pub fallback_name: Option<String>,
    pub custom_editor_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Color,
    Vector,
    Float,
    Range,
    Texture,
    Unsupported(i32),
}

impl PropertyType {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Color,
            1 => Self::Vector,
            2 => Self::Float,
            3 => Self::Range,
            4 => Self::Texture,
            other => Self::Unsupported(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureDimension {
    #[default]
    Unknown,
    None,
    Any,
    Tex2D,
    Tex3D,
    Cube,
    Tex2DArray,
    CubeArray,
}

impl TextureDimension {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Any,
            2 => Self::Tex2D,
            3 => Self::Tex3D,
            4 => Self::Cube,
            5 => Self::Tex2DArray,
            6 => Self::CubeArray,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureDefault {
    pub default_name: String,
    pub dimension: TextureDimension,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub description: String,
    pub attributes: Vec<String>,
    pub prop_type: PropertyType,
    pub flags: u32,
    /// Color/Vector use all four; Float uses `[0]`; Range is `[value, min, max, _]`.
    pub def_value: [f32; 4],
    pub def_texture: TextureDefault,
}

/// Ordered `key = value` tags.
pub type TagMap = Vec<(String, String)>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubShader {
    /// 0 means unset.
    pub lod: i32,
    pub tags: TagMap,
    pub passes: Vec<Pass>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pass {
    Normal(NormalPass),
    Use { name: String },
    Grab { texture_name: Option<String> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalPass {
    pub state: RenderState,
    pub programs: ProgramBlocks,
}

/// Sub-program references per stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramBlocks {
    pub vertex: Vec<SubProgramRef>,
    pub fragment: Vec<SubProgramRef>,
    pub geometry: Vec<SubProgramRef>,
    pub hull: Vec<SubProgramRef>,
    pub domain: Vec<SubProgramRef>,
    pub ray_tracing: Vec<SubProgramRef>,
}

impl ProgramBlocks {
    /// Stages in emission order with their `Program` tags.
    pub fn stages(&self) -> [(&'static str, &[SubProgramRef]); 6] {
        [
            ("vp", self.vertex.as_slice()),
            ("fp", self.fragment.as_slice()),
            ("gp", self.geometry.as_slice()),
            ("hp", self.hull.as_slice()),
            ("dp", self.domain.as_slice()),
            ("rtp", self.ray_tracing.as_slice()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubProgramRef {
    pub blob_index: u32,
    pub program_type: ShaderGpuProgramType,
    pub hardware_tier: i32,
}

/// Numeric render-state value, optionally driven by a material property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderFloatValue {
    pub val: f32,
    pub name: String,
}

impl ShaderFloatValue {
    pub fn new(val: f32) -> Self {
        Self {
            val,
            name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorValue {
    pub x: ShaderFloatValue,
    pub y: ShaderFloatValue,
    pub z: ShaderFloatValue,
    pub w: ShaderFloatValue,
}

impl VectorValue {
    pub fn is_zero(&self) -> bool {
        [&self.x, &self.y, &self.z, &self.w].iter().all(|v| v.val == 0.0)
    }
}

bitflags! {
    /// Color write mask as stored in render state. Alpha is the low bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ColorMask: u8 {
        const A = 0x1;
        const R = 0x2;
        const G = 0x4;
        const B = 0x8;
    }
}

impl ColorMask {
    /// Channel letters in `RGBA` order.
    pub fn letters(self) -> String {
        [(Self::R, 'R'), (Self::G, 'G'), (Self::B, 'B'), (Self::A, 'A')]
            .into_iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, c)| c)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RtBlendState {
    pub src_blend: ShaderFloatValue,
    pub dest_blend: ShaderFloatValue,
    pub src_blend_alpha: ShaderFloatValue,
    pub dest_blend_alpha: ShaderFloatValue,
    pub blend_op: ShaderFloatValue,
    pub blend_op_alpha: ShaderFloatValue,
    pub col_mask: ShaderFloatValue,
}

impl Default for RtBlendState {
    fn default() -> Self {
        Self {
            src_blend: ShaderFloatValue::new(1.0),
            dest_blend: ShaderFloatValue::new(0.0),
            src_blend_alpha: ShaderFloatValue::new(1.0),
            dest_blend_alpha: ShaderFloatValue::new(0.0),
            blend_op: ShaderFloatValue::new(0.0),
            blend_op_alpha: ShaderFloatValue::new(0.0),
            col_mask: ShaderFloatValue::new(15.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StencilOp {
    pub pass: ShaderFloatValue,
    pub fail: ShaderFloatValue,
    pub zfail: ShaderFloatValue,
    pub comp: ShaderFloatValue,
}

impl Default for StencilOp {
    fn default() -> Self {
        Self {
            pass: ShaderFloatValue::new(0.0),
            fail: ShaderFloatValue::new(0.0),
            zfail: ShaderFloatValue::new(0.0),
            comp: ShaderFloatValue::new(8.0),
        }
    }
}

impl StencilOp {
    pub fn is_default(&self) -> bool {
        self.pass.val == 0.0 && self.fail.val == 0.0 && self.zfail.val == 0.0 && self.comp.val == 8.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FogMode {
    #[default]
    Unknown,
    Disabled,
    Linear,
    Exp,
    Exp2,
    Other(i32),
}

impl FogMode {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            -1 => Self::Unknown,
            0 => Self::Disabled,
            1 => Self::Linear,
            2 => Self::Exp,
            3 => Self::Exp2,
            other => Self::Other(other),
        }
    }
}

/// Fixed-function state of one pass. Every field defaults to the engine
/// default, which the serializer suppresses.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub name: String,
    pub lod: i32,
    pub tags: TagMap,
    pub rt_blend: Vec<RtBlendState>,
    pub rt_separate_blend: bool,
    pub alpha_to_mask: ShaderFloatValue,
    /// Absent in assets older than the field.
    pub zclip: Option<ShaderFloatValue>,
    pub ztest: ShaderFloatValue,
    pub zwrite: ShaderFloatValue,
    pub culling: ShaderFloatValue,
    pub offset_factor: ShaderFloatValue,
    pub offset_units: ShaderFloatValue,
    pub stencil_ref: ShaderFloatValue,
    pub stencil_read_mask: ShaderFloatValue,
    pub stencil_write_mask: ShaderFloatValue,
    pub stencil_op: StencilOp,
    pub stencil_op_front: StencilOp,
    pub stencil_op_back: StencilOp,
    pub fog_mode: FogMode,
    pub fog_color: VectorValue,
    pub fog_density: ShaderFloatValue,
    pub fog_start: ShaderFloatValue,
    pub fog_end: ShaderFloatValue,
    pub lighting: bool,
    pub gpu_program_id: i32,
}

/// Render targets carried by every serialized state.
pub const RENDER_TARGET_COUNT: usize = 8;

impl Default for RenderState {
    fn default() -> Self {
        Self {
            name: String::new(),
            lod: 0,
            tags: TagMap::new(),
            rt_blend: vec![RtBlendState::default(); RENDER_TARGET_COUNT],
            rt_separate_blend: false,
            alpha_to_mask: ShaderFloatValue::new(0.0),
            zclip: Some(ShaderFloatValue::new(1.0)),
            ztest: ShaderFloatValue::new(4.0),
            zwrite: ShaderFloatValue::new(1.0),
            culling: ShaderFloatValue::new(2.0),
            offset_factor: ShaderFloatValue::new(0.0),
            offset_units: ShaderFloatValue::new(0.0),
            stencil_ref: ShaderFloatValue::new(0.0),
            stencil_read_mask: ShaderFloatValue::new(255.0),
            stencil_write_mask: ShaderFloatValue::new(255.0),
            stencil_op: StencilOp::default(),
            stencil_op_front: StencilOp::default(),
            stencil_op_back: StencilOp::default(),
            fog_mode: FogMode::Unknown,
            fog_color: VectorValue::default(),
            fog_density: ShaderFloatValue::new(0.0),
            fog_start: ShaderFloatValue::new(0.0),
            fog_end: ShaderFloatValue::new(0.0),
            lighting: false,
            gpu_program_id: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_mask_letters_follow_rgba_order() {
        assert_eq!(ColorMask::all().letters(), "RGBA");
        assert_eq!(ColorMask::from_bits_truncate(0xD).letters(), "GBA");
        assert_eq!(ColorMask::from_bits_truncate(0xE).letters(), "RGB");
        assert_eq!(ColorMask::from_bits_truncate(0x6).letters(), "RG");
        assert_eq!(ColorMask::from_bits_truncate(0x3).letters(), "RA");
        assert_eq!(ColorMask::from_bits_truncate(0x2).letters(), "R");
        assert_eq!(ColorMask::from_bits_truncate(0x1).letters(), "A");
        assert_eq!(ColorMask::empty().letters(), "");
    }

    #[test]
    fn enum_fallbacks() {
        assert_eq!(PropertyType::from_raw(5), PropertyType::Unsupported(5));
        assert_eq!(TextureDimension::from_raw(42), TextureDimension::Unknown);
        assert_eq!(FogMode::from_raw(9), FogMode::Other(9));
    }
}
