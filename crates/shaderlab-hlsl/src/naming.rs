//! Identifier conventions shared by the emitted function and its surrounding
//! struct declarations.

use shaderlab_dxbc::signature::component_type;
use shaderlab_dxbc::SignatureEntry;

/// Vertex input struct type.
pub const VERTEX_INPUT_STRUCT: &str = "appdata_full";
/// Vertex output / fragment input struct type.
pub const VERT_TO_FRAG_STRUCT: &str = "v2f";
pub const FRAGMENT_OUTPUT_STRUCT: &str = "fout";
pub const VERTEX_INPUT_NAME: &str = "v";
pub const FRAGMENT_INPUT_NAME: &str = "inp";
pub const OUTPUT_NAME: &str = "o";
pub const TEMP_PREFIX: &str = "tmp";
pub const FACING_NAME: &str = "facing";
pub const FACING_SEMANTIC: &str = "SV_IsFrontFace";

fn base_field_name(semantic: &str) -> String {
    match semantic {
        "POSITION" => "vertex".to_owned(),
        "NORMAL" => "normal".to_owned(),
        "TANGENT" => "tangent".to_owned(),
        "COLOR" => "color".to_owned(),
        "TEXCOORD" => "texcoord".to_owned(),
        "SV_POSITION" => "position".to_owned(),
        other => other.to_ascii_lowercase(),
    }
}

/// Field name of an input signature entry; the index is appended when non-zero.
pub fn input_field_name(entry: &SignatureEntry) -> String {
    let base = base_field_name(&entry.semantic_name);
    if entry.semantic_index > 0 {
        format!("{base}{}", entry.semantic_index)
    } else {
        base
    }
}

/// Field name of an output signature entry; always indexed except `SV_POSITION`.
pub fn output_field_name(entry: &SignatureEntry) -> String {
    let base = base_field_name(&entry.semantic_name);
    if entry.semantic_name == "SV_POSITION" {
        base
    } else {
        format!("{base}{}", entry.semantic_index)
    }
}

/// HLSL type of a signature entry, e.g. `float4` or `uint`.
pub fn format_name(entry: &SignatureEntry) -> String {
    let scalar = match entry.component_type {
        component_type::SINT32 => "int",
        component_type::UINT32 => "uint",
        _ => "float",
    };
    let count = entry.mask.count_ones();
    if count > 1 {
        format!("{scalar}{count}")
    } else {
        scalar.to_owned()
    }
}

/// Semantic with its index, e.g. `TEXCOORD1`.
pub fn semantic_with_index(entry: &SignatureEntry) -> String {
    format!("{}{}", entry.semantic_name, entry.semantic_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, index: u32, mask: u8) -> SignatureEntry {
        SignatureEntry {
            semantic_name: name.to_owned(),
            semantic_index: index,
            register: 0,
            system_value_type: 0,
            component_type: component_type::FLOAT32,
            mask,
            read_write_mask: mask,
            stream: None,
        }
    }

    #[test]
    fn input_names() {
        assert_eq!(input_field_name(&entry("POSITION", 0, 0xF)), "vertex");
        assert_eq!(input_field_name(&entry("TEXCOORD", 0, 0x3)), "texcoord");
        assert_eq!(input_field_name(&entry("TEXCOORD", 2, 0x3)), "texcoord2");
        assert_eq!(input_field_name(&entry("COLOR", 1, 0xF)), "color1");
        assert_eq!(input_field_name(&entry("BLENDWEIGHT", 0, 0xF)), "blendweight");
    }

    #[test]
    fn output_names_keep_index() {
        assert_eq!(output_field_name(&entry("SV_POSITION", 0, 0xF)), "position");
        assert_eq!(output_field_name(&entry("TEXCOORD", 0, 0x3)), "texcoord0");
        assert_eq!(output_field_name(&entry("SV_Target", 0, 0xF)), "sv_target0");
    }

    #[test]
    fn formats() {
        assert_eq!(format_name(&entry("TEXCOORD", 0, 0x3)), "float2");
        assert_eq!(format_name(&entry("TEXCOORD", 0, 0x4)), "float");
        let mut id = entry("SV_InstanceID", 0, 0x1);
        id.component_type = component_type::UINT32;
        assert_eq!(format_name(&id), "uint");
    }
}
