use crate::version::EngineVersion;

/// Inputs to container and sub-program decoding that come from the
/// surrounding asset rather than the blob itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Clamps sub-program versions above `201806140` down to it.
    pub has_updated_gpu_program: bool,
    /// Segments are stored uncompressed and copied as-is.
    pub segments_uncompressed: bool,
    pub engine_version: EngineVersion,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            has_updated_gpu_program: false,
            segments_uncompressed: false,
            engine_version: EngineVersion::new(2019, 4),
        }
    }
}

/// Layout of decompiled DX11 program text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HlslOptions {
    pub indent_width: usize,
    /// Depth of struct, buffer and function declarations.
    pub declaration_depth: usize,
    /// Depth of the function body.
    pub body_depth: usize,
}

impl Default for HlslOptions {
    fn default() -> Self {
        Self {
            indent_width: shaderlab_hlsl::INDENT_WIDTH,
            declaration_depth: 3,
            body_depth: 4,
        }
    }
}
