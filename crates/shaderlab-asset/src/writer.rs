//! ShaderLab text for a parsed shader: properties, sub-shaders, passes,
//! render state and the selected sub-program sections.

use tracing::warn;

use crate::asset::{
    ColorMask, FogMode, NormalPass, Pass, Property, PropertyType, RenderState, RtBlendState,
    ShaderAsset, StencilOp, SubProgramRef, SubShader, TextureDimension,
};
use crate::container::ShaderProgram;
use crate::error::{Result, ShaderError};
use crate::keywords;
use crate::options::HlslOptions;
use crate::platform::ShaderCompilerPlatform;
use crate::selector::select_sub_programs;

/// Banner prepended to every converted shader.
pub const HEADER: &str = "//////////////////////////////////////////\n\
                          //\n\
                          // NOTE: This is *not* a valid shader file\n\
                          //\n\
                          ///////////////////////////////////////////\n";

/// Shortest round-trip text of a float, without a trailing `.0`.
pub fn format_float(v: f32) -> String {
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    format!("{v}")
}

fn tag_map(tags: &[(String, String)], indent: usize) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let mut out = " ".repeat(indent);
    out.push_str("Tags { ");
    for (key, value) in tags {
        out.push_str(&format!("\"{key}\" = \"{value}\" "));
    }
    out.push_str("}\n");
    out
}

pub fn write_property(prop: &Property) -> Result<String> {
    let mut out = String::new();
    for attribute in &prop.attributes {
        out.push_str(&format!("[{attribute}] "));
    }
    out.push_str(&format!("{} (\"{}\", ", prop.name, prop.description));

    let [v0, v1, v2, v3] = prop.def_value.map(format_float);
    match prop.prop_type {
        PropertyType::Color => out.push_str("Color"),
        PropertyType::Vector => out.push_str("Vector"),
        PropertyType::Float => out.push_str("Float"),
        PropertyType::Range => out.push_str(&format!("Range({v1}, {v2})")),
        PropertyType::Texture => out.push_str(match prop.def_texture.dimension {
            TextureDimension::Any => "any",
            TextureDimension::Tex2D => "2D",
            TextureDimension::Tex3D => "3D",
            TextureDimension::Cube => "Cube",
            TextureDimension::Tex2DArray => "2DArray",
            TextureDimension::CubeArray => "CubeArray",
            TextureDimension::Unknown | TextureDimension::None => "",
        }),
        PropertyType::Unsupported(raw) => return Err(ShaderError::UnsupportedPropertyType(raw)),
    }
    out.push_str(") = ");

    match prop.prop_type {
        PropertyType::Color | PropertyType::Vector => {
            out.push_str(&format!("({v0},{v1},{v2},{v3})"));
        }
        PropertyType::Float | PropertyType::Range => out.push_str(&v0),
        PropertyType::Texture => {
            out.push_str(&format!("\"{}\" {{ }}", prop.def_texture.default_name));
        }
        PropertyType::Unsupported(raw) => return Err(ShaderError::UnsupportedPropertyType(raw)),
    }
    out.push('\n');
    Ok(out)
}

fn rt_blend(out: &mut String, index: usize, blend: &RtBlendState, separate: bool) {
    let target = if index != 0 || separate {
        format!("{index} ")
    } else {
        String::new()
    };

    let alpha_default = blend.src_blend_alpha.val == 1.0 && blend.dest_blend_alpha.val == 0.0;
    if blend.src_blend.val != 1.0 || blend.dest_blend.val != 0.0 || !alpha_default {
        out.push_str(&format!(
            "  Blend {target}{} {}",
            keywords::blend_factor(blend.src_blend.val),
            keywords::blend_factor(blend.dest_blend.val)
        ));
        if !alpha_default {
            out.push_str(&format!(
                ", {} {}",
                keywords::blend_factor(blend.src_blend_alpha.val),
                keywords::blend_factor(blend.dest_blend_alpha.val)
            ));
        }
        out.push('\n');
    }

    if blend.blend_op.val != 0.0 || blend.blend_op_alpha.val != 0.0 {
        out.push_str(&format!("  BlendOp {target}{}", keywords::blend_op(blend.blend_op.val)));
        if blend.blend_op_alpha.val != 0.0 {
            out.push_str(&format!(", {}", keywords::blend_op(blend.blend_op_alpha.val)));
        }
        out.push('\n');
    }

    let mask = blend.col_mask.val as i32;
    if mask != 0xF {
        let letters = if mask == 0 {
            "0".to_owned()
        } else {
            ColorMask::from_bits_truncate((mask & 0xF) as u8).letters()
        };
        out.push_str(&format!("  ColorMask {letters} {index}\n"));
    }
}

fn stencil_op(out: &mut String, op: &StencilOp, suffix: &str) {
    out.push_str(&format!("   Comp{suffix} {}\n", keywords::stencil_comp(op.comp.val)));
    out.push_str(&format!("   Pass{suffix} {}\n", keywords::stencil_op(op.pass.val)));
    out.push_str(&format!("   Fail{suffix} {}\n", keywords::stencil_op(op.fail.val)));
    out.push_str(&format!("   ZFail{suffix} {}\n", keywords::stencil_op(op.zfail.val)));
}

/// Render-state lines of a normal pass. Values equal to their default are
/// omitted; `GpuProgramID` is always written.
pub fn write_render_state(state: &RenderState) -> String {
    let mut out = String::new();
    if !state.name.is_empty() {
        out.push_str(&format!("  Name \"{}\"\n", state.name));
    }
    if state.lod != 0 {
        out.push_str(&format!("  LOD {}\n", state.lod));
    }
    out.push_str(&tag_map(&state.tags, 2));

    for (i, blend) in state.rt_blend.iter().enumerate() {
        rt_blend(&mut out, i, blend, state.rt_separate_blend);
    }

    if state.alpha_to_mask.val > 0.0 {
        out.push_str("  AlphaToMask On\n");
    }
    // A missing value counts as disabled.
    if state.zclip.as_ref().map_or(true, |z| z.val != 1.0) {
        out.push_str("  ZClip Off\n");
    }
    if state.ztest.val != 4.0 {
        out.push_str(&format!("  ZTest {}\n", keywords::ztest(state.ztest.val)));
    }
    if state.zwrite.val != 1.0 {
        out.push_str("  ZWrite Off\n");
    }
    if state.culling.val != 2.0 {
        out.push_str(&format!("  Cull {}\n", keywords::cull(state.culling.val)));
    }
    if state.offset_factor.val != 0.0 || state.offset_units.val != 0.0 {
        out.push_str(&format!(
            "  Offset {}, {}\n",
            format_float(state.offset_factor.val),
            format_float(state.offset_units.val)
        ));
    }

    let ops = [
        (&state.stencil_op, ""),
        (&state.stencil_op_front, "Front"),
        (&state.stencil_op_back, "Back"),
    ];
    if state.stencil_ref.val != 0.0
        || state.stencil_read_mask.val != 255.0
        || state.stencil_write_mask.val != 255.0
        || ops.iter().any(|(op, _)| !op.is_default())
    {
        out.push_str("  Stencil {\n");
        if state.stencil_ref.val != 0.0 {
            out.push_str(&format!("   Ref {}\n", format_float(state.stencil_ref.val)));
        }
        if state.stencil_read_mask.val != 255.0 {
            out.push_str(&format!("   ReadMask {}\n", format_float(state.stencil_read_mask.val)));
        }
        if state.stencil_write_mask.val != 255.0 {
            out.push_str(&format!("   WriteMask {}\n", format_float(state.stencil_write_mask.val)));
        }
        for (op, suffix) in ops {
            if !op.is_default() {
                stencil_op(&mut out, op, suffix);
            }
        }
        out.push_str("  }\n");
    }

    let fog_range = state.fog_start.val != 0.0 || state.fog_end.val != 0.0;
    if state.fog_mode != FogMode::Unknown
        || !state.fog_color.is_zero()
        || state.fog_density.val != 0.0
        || fog_range
    {
        out.push_str("  Fog {\n");
        if state.fog_mode != FogMode::Unknown {
            let mode = match state.fog_mode {
                FogMode::Disabled => "Off",
                FogMode::Linear => "Linear",
                FogMode::Exp => "Exp",
                FogMode::Exp2 => "Exp2",
                FogMode::Unknown | FogMode::Other(_) => {
                    warn!(mode = ?state.fog_mode, "unknown fog mode");
                    ""
                }
            };
            out.push_str(&format!("   Mode {mode}\n"));
        }
        if !state.fog_color.is_zero() {
            let c = &state.fog_color;
            out.push_str(&format!(
                "   Color ({},{},{},{})\n",
                format_float(c.x.val),
                format_float(c.y.val),
                format_float(c.z.val),
                format_float(c.w.val)
            ));
        }
        if state.fog_density.val != 0.0 {
            out.push_str(&format!("   Density {}\n", format_float(state.fog_density.val)));
        }
        if fog_range {
            out.push_str(&format!(
                "   Range {}, {}\n",
                format_float(state.fog_start.val),
                format_float(state.fog_end.val)
            ));
        }
        out.push_str("  }\n");
    }

    // Only ever "On"; a disabled flag writes nothing.
    if state.lighting {
        out.push_str("  Lighting On\n");
    }

    out.push_str(&format!("  GpuProgramID {}\n", state.gpu_program_id));
    out
}

/// Serializes a parsed shader against the decoded program containers, one
/// per entry of `platforms`.
pub struct ShaderWriter<'a> {
    platforms: &'a [ShaderCompilerPlatform],
    programs: &'a [ShaderProgram],
    hlsl: HlslOptions,
}

impl<'a> ShaderWriter<'a> {
    pub fn new(platforms: &'a [ShaderCompilerPlatform], programs: &'a [ShaderProgram]) -> Self {
        Self {
            platforms,
            programs,
            hlsl: HlslOptions::default(),
        }
    }

    pub fn with_hlsl_options(mut self, hlsl: HlslOptions) -> Self {
        self.hlsl = hlsl;
        self
    }

    /// Full `Shader "name" { ... }` block, without trailing newline.
    pub fn write(&self, shader: &ShaderAsset) -> Result<String> {
        let mut out = format!("Shader \"{}\" {{\n", shader.name);

        out.push_str("Properties {\n");
        for prop in &shader.properties {
            out.push_str(&write_property(prop)?);
        }
        out.push_str("}\n");

        for sub_shader in &shader.sub_shaders {
            out.push_str(&self.sub_shader(sub_shader)?);
        }

        if let Some(fallback) = shader.fallback_name.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(&format!("Fallback \"{fallback}\"\n"));
        }
        if let Some(editor) = shader.custom_editor_name.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(&format!("CustomEditor \"{editor}\"\n"));
        }
        out.push('}');
        Ok(out)
    }

    fn sub_shader(&self, sub_shader: &SubShader) -> Result<String> {
        let mut out = String::from("SubShader {\n");
        if sub_shader.lod != 0 {
            out.push_str(&format!(" LOD {}\n", sub_shader.lod));
        }
        out.push_str(&tag_map(&sub_shader.tags, 1));
        for pass in &sub_shader.passes {
            out.push_str(&self.pass(pass)?);
        }
        out.push_str("}\n");
        Ok(out)
    }

    fn pass(&self, pass: &Pass) -> Result<String> {
        let mut out = String::new();
        match pass {
            Pass::Use { name } => out.push_str(&format!(" UsePass \"{name}\"\n")),
            Pass::Grab { texture_name } => {
                out.push_str(" GrabPass {\n");
                if let Some(tex) = texture_name.as_deref().filter(|s| !s.is_empty()) {
                    out.push_str(&format!("  \"{tex}\"\n"));
                }
                out.push_str("}\n");
            }
            Pass::Normal(normal) => {
                out.push_str(" Pass {\n");
                out.push_str(&self.normal_pass(normal)?);
                out.push_str("}\n");
            }
        }
        Ok(out)
    }

    fn normal_pass(&self, pass: &NormalPass) -> Result<String> {
        let mut out = write_render_state(&pass.state);
        for (tag, refs) in pass.programs.stages() {
            if refs.is_empty() {
                continue;
            }
            out.push_str(&format!("Program \"{tag}\" {{\n"));
            out.push_str(&self.sub_programs(refs)?);
            out.push_str("}\n");
        }
        Ok(out)
    }

    fn sub_programs(&self, refs: &[SubProgramRef]) -> Result<String> {
        let mut out = String::new();
        for section in select_sub_programs(refs, self.platforms)? {
            let blob_index = section.reference.blob_index as usize;
            let sub_program = self
                .programs
                .get(section.platform_index)
                .ok_or(ShaderError::MissingSubProgram(blob_index))?
                .sub_program(blob_index)?;
            out.push_str(&format!("SubProgram \"{}\" {{\n", section.label()));
            out.push_str(&sub_program.export_with(&self.hlsl)?);
            out.push_str("\n}\n");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::asset::{ShaderFloatValue, TextureDefault};

    fn prop(prop_type: PropertyType, def_value: [f32; 4]) -> Property {
        Property {
            name: "_P".into(),
            description: "Desc".into(),
            attributes: vec![],
            prop_type,
            flags: 0,
            def_value,
            def_texture: TextureDefault::default(),
        }
    }

    #[test]
    fn property_lines() {
        let mut color = prop(PropertyType::Color, [1.0, 0.5, 0.0, 1.0]);
        color.attributes = vec!["HDR".into(), "Gamma".into()];
        assert_eq!(
            write_property(&color).unwrap(),
            "[HDR] [Gamma] _P (\"Desc\", Color) = (1,0.5,0,1)\n"
        );

        let range = prop(PropertyType::Range, [0.25, 0.0, 2.0, 0.0]);
        assert_eq!(
            write_property(&range).unwrap(),
            "_P (\"Desc\", Range(0, 2)) = 0.25\n"
        );

        let mut tex = prop(PropertyType::Texture, [0.0; 4]);
        tex.def_texture = TextureDefault {
            default_name: "white".into(),
            dimension: TextureDimension::Cube,
        };
        assert_eq!(
            write_property(&tex).unwrap(),
            "_P (\"Desc\", Cube) = \"white\" { }\n"
        );

        let int = prop(PropertyType::Unsupported(5), [0.0; 4]);
        assert!(matches!(
            write_property(&int),
            Err(ShaderError::UnsupportedPropertyType(5))
        ));
    }

    #[test]
    fn blend_lines_carry_target_prefix() {
        let mut state = RenderState::default();
        state.rt_blend[0].src_blend = ShaderFloatValue::new(5.0);
        state.rt_blend[0].dest_blend = ShaderFloatValue::new(10.0);
        state.rt_blend[1].blend_op = ShaderFloatValue::new(2.0);
        state.rt_blend[1].blend_op_alpha = ShaderFloatValue::new(4.0);
        state.rt_blend[1].col_mask = ShaderFloatValue::new(0.0);
        assert_eq!(
            write_render_state(&state),
            "  Blend SrcAlpha OneMinusSrcAlpha\n  BlendOp 1 RevSub, Max\n  ColorMask 0 1\n  GpuProgramID 0\n"
        );

        state.rt_separate_blend = true;
        state.rt_blend[0].src_blend_alpha = ShaderFloatValue::new(0.0);
        assert!(write_render_state(&state)
            .starts_with("  Blend 0 SrcAlpha OneMinusSrcAlpha, Zero Zero\n"));
    }

    #[test]
    fn stencil_and_fog_blocks() {
        let mut state = RenderState::default();
        state.stencil_ref = ShaderFloatValue::new(2.0);
        state.stencil_op_back.pass = ShaderFloatValue::new(2.0);
        state.fog_mode = FogMode::Linear;
        state.fog_start = ShaderFloatValue::new(1.0);
        state.fog_end = ShaderFloatValue::new(100.5);
        state.lighting = true;
        state.gpu_program_id = 42;
        assert_eq!(
            write_render_state(&state),
            "  Stencil {\n   Ref 2\n   CompBack Always\n   PassBack Replace\n   FailBack Keep\n   ZFailBack Keep\n  }\n  Fog {\n   Mode Linear\n   Range 1, 100.5\n  }\n  Lighting On\n  GpuProgramID 42\n"
        );
    }

    #[test]
    fn zclip_off_when_disabled_or_missing() {
        let mut state = RenderState::default();
        assert_eq!(write_render_state(&state), "  GpuProgramID 0\n");
        state.zclip = None;
        assert_eq!(write_render_state(&state), "  ZClip Off\n  GpuProgramID 0\n");
        state.zclip = Some(ShaderFloatValue::new(0.0));
        assert_eq!(write_render_state(&state), "  ZClip Off\n  GpuProgramID 0\n");
    }

    #[test]
    fn non_normal_passes() {
        let shader = ShaderAsset {
            name: "Hidden/Blit".into(),
            sub_shaders: vec![SubShader {
                lod: 100,
                tags: vec![("Queue".into(), "Transparent".into())],
                passes: vec![
                    Pass::Use {
                        name: "Other/PASS".into(),
                    },
                    Pass::Grab {
                        texture_name: Some("_Grab".into()),
                    },
                ],
            }],
            fallback_name: Some("Diffuse".into()),
            custom_editor_name: Some(String::new()),
            ..ShaderAsset::default()
        };
        let text = ShaderWriter::new(&[], &[]).write(&shader).unwrap();
        assert_eq!(
            text,
            "Shader \"Hidden/Blit\" {\nProperties {\n}\nSubShader {\n LOD 100\n Tags { \"Queue\" = \"Transparent\" }\n UsePass \"Other/PASS\"\n GrabPass {\n  \"_Grab\"\n}\n}\nFallback \"Diffuse\"\n}"
        );
    }

    #[test]
    fn floats_print_without_trailing_zero() {
        assert_eq!(format_float(1.0), "1");
        assert_eq!(format_float(-0.25), "-0.25");
        assert_eq!(format_float(f32::INFINITY), "Infinity");
    }
}
