use tracing::debug;

use crate::asset::Shader;
use crate::decompress::{decode_legacy_blob, decode_segmented, decompressor_for, Lz4BlockDecompressor};
use crate::error::Result;
use crate::options::{DecodeOptions, HlslOptions};
use crate::writer::{ShaderWriter, HEADER};

/// Converts a shader object to ShaderLab text.
pub fn convert_shader(shader: &Shader, options: &DecodeOptions) -> Result<String> {
    convert_shader_with(shader, options, &HlslOptions::default())
}

/// Like [`convert_shader`], with explicit layout for decompiled programs.
///
/// Legacy assets substitute sub-program exports into their script text,
/// segmented assets serialize the parsed form, and anything else returns the
/// stored script.
pub fn convert_shader_with(shader: &Shader, options: &DecodeOptions, hlsl: &HlslOptions) -> Result<String> {
    if let Some(legacy) = &shader.sub_program_blob {
        debug!("converting legacy sub-program blob");
        let program = decode_legacy_blob(
            &legacy.data,
            legacy.decompressed_size as usize,
            options,
            &Lz4BlockDecompressor,
        )?;
        let script = String::from_utf8_lossy(&shader.script);
        return Ok(format!("{HEADER}{}", program.export_legacy_script(&script)?));
    }

    if let Some(blob) = &shader.compressed_blob {
        debug!(platforms = blob.platforms.len(), "converting segmented shader");
        let programs = decode_segmented(blob, options, decompressor_for(options))?;
        let text = ShaderWriter::new(&blob.platforms, &programs)
            .with_hlsl_options(*hlsl)
            .write(&shader.parsed_form)?;
        return Ok(format!("{HEADER}{text}"));
    }

    Ok(format!("{HEADER}{}", String::from_utf8_lossy(&shader.script)))
}
