//! Decoding and text export of a single compiled sub-program.

use tracing::debug;

use crate::error::Result;
use crate::export::decompiled_program_text;
use crate::options::HlslOptions;
use crate::params::{BindChannels, ParameterTable};
use crate::platform::ShaderGpuProgramType;
use crate::reader::{ByteCursor, ByteSource};

/// Versions above this are clamped down to it for assets flagged with the
/// updated GPU program layout.
pub const VERSION_CLAMP: i32 = 201806140;
/// From this version on, the header carries one more reserved word.
pub const EXTRA_HEADER_WORD_VERSION: i32 = 201608170;
/// Local keywords are stored for versions in `LOCAL_KEYWORDS_START..LOCAL_KEYWORDS_END`.
pub const LOCAL_KEYWORDS_START: i32 = 201806140;
pub const LOCAL_KEYWORDS_END: i32 = 202012090;

const METAL_MAGIC: u32 = 0xf00d_cafe;
const DXBC_UNSUPPORTED: &str = "// shader disassembly not supported on DXBC";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSubProgram {
    /// Effective version, after clamping.
    pub version: i32,
    pub program_type: ShaderGpuProgramType,
    pub keywords: Vec<String>,
    /// `None` for versions that do not store local keywords.
    pub local_keywords: Option<Vec<String>>,
    pub program_code: Vec<u8>,
    pub bind_channels: BindChannels,
    pub parameters: ParameterTable,
}

fn read_string_list(r: &mut impl ByteSource) -> Result<Vec<String>> {
    let count = r.read_len()?;
    let mut out = Vec::new();
    for _ in 0..count {
        out.push(r.read_aligned_string()?);
    }
    Ok(out)
}

impl ShaderSubProgram {
    /// Decodes one sub-program starting at the cursor position.
    pub fn read(r: &mut impl ByteSource, has_updated_gpu_program: bool) -> Result<Self> {
        let mut version = r.read_i32_le()?;
        if has_updated_gpu_program && version > VERSION_CLAMP {
            version = VERSION_CLAMP;
        }
        let program_type = ShaderGpuProgramType::from_raw(r.read_i32_le()?);
        r.skip(12)?;
        if version >= EXTRA_HEADER_WORD_VERSION {
            r.skip(4)?;
        }

        let keywords = read_string_list(r)?;
        let local_keywords = if (LOCAL_KEYWORDS_START..LOCAL_KEYWORDS_END).contains(&version) {
            Some(read_string_list(r)?)
        } else {
            None
        };

        let program_code = r.read_byte_vec()?;
        r.align_to_4();

        let bind_channels = BindChannels::read(r)?;
        let parameters = ParameterTable::read(r)?;

        debug!(
            version,
            %program_type,
            code_len = program_code.len(),
            keywords = keywords.len(),
            "decoded sub-program"
        );

        Ok(Self {
            version,
            program_type,
            keywords,
            local_keywords,
            program_code,
            bind_channels,
            parameters,
        })
    }

    /// Global and local keywords in declaration order.
    pub fn all_keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords
            .iter()
            .chain(self.local_keywords.iter().flatten())
            .map(String::as_str)
    }

    pub fn export(&self) -> Result<String> {
        self.export_with(&HlslOptions::default())
    }

    /// Renders the keyword blocks and the quoted program text.
    pub fn export_with(&self, options: &HlslOptions) -> Result<String> {
        let mut out = String::new();
        if !self.keywords.is_empty() {
            out.push_str(&keyword_block("Keywords", &self.keywords));
        }
        if let Some(local) = self.local_keywords.as_ref().filter(|k| !k.is_empty()) {
            out.push_str(&keyword_block("Local Keywords", local));
        }

        out.push('"');
        if !self.program_code.is_empty() {
            out.push_str(&self.program_text(options)?);
        }
        out.push('"');
        Ok(out)
    }

    fn program_text(&self, options: &HlslOptions) -> Result<String> {
        use ShaderGpuProgramType as T;

        if let Some(stage) = self.program_type.decompile_stage() {
            return decompiled_program_text(self, stage, options);
        }
        Ok(match self.program_type {
            T::GLLegacy
            | T::GLES31AEP
            | T::GLES31
            | T::GLES3
            | T::GLES
            | T::GLCore32
            | T::GLCore41
            | T::GLCore43
            | T::ConsoleVS
            | T::ConsoleFS
            | T::ConsoleHS
            | T::ConsoleDS
            | T::ConsoleGS => String::from_utf8_lossy(&self.program_code).into_owned(),
            T::DX9VertexSM20
            | T::DX9VertexSM30
            | T::DX9PixelSM20
            | T::DX9PixelSM30
            | T::DX11GeometrySM40
            | T::DX11GeometrySM50
            | T::DX11HullSM50
            | T::DX11DomainSM50 => DXBC_UNSUPPORTED.to_owned(),
            T::MetalVS | T::MetalFS => metal_source(&self.program_code)?,
            other => format!("//shader disassembly not supported on {other}"),
        })
    }
}

fn keyword_block(label: &str, keywords: &[String]) -> String {
    let mut out = format!("{label} {{ ");
    for keyword in keywords {
        out.push_str(&format!("\"{keyword}\" "));
    }
    out.push_str("}\n");
    out
}

/// Metal blobs may start with a header pointing at the entry name; the
/// source text follows the NUL-terminated entry name.
fn metal_source(code: &[u8]) -> Result<String> {
    let mut r = ByteCursor::new(code);
    if r.read_u32_le()? == METAL_MAGIC {
        let offset = r.read_len()?;
        r.seek(offset);
    }
    let _entry_name = r.read_cstring()?;
    let rest = code.get(r.position()..).unwrap_or_default();
    Ok(String::from_utf8_lossy(rest).into_owned())
}
