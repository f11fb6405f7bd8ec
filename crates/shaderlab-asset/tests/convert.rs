mod common;

use common::{container, dx11_vertex_spec, SubProgramSpec, DX11_VERTEX_EXPORT};
use pretty_assertions::assert_eq;
use shaderlab_asset::asset::{
    LegacyBlob, NormalPass, Pass, ProgramBlocks, Property, PropertyType, RenderState,
    SegmentedBlob, Shader, ShaderAsset, SubProgramRef, SubShader, TextureDefault,
    TextureDimension,
};
use shaderlab_asset::{
    convert_shader, DecodeOptions, ShaderCompilerPlatform, ShaderError, ShaderGpuProgramType,
    HEADER,
};

const GLES_SOURCE: &str = "#version 300 es\nvoid main() {}\n";

fn main_tex() -> Property {
    Property {
        name: "_MainTex".into(),
        description: "Base (RGB)".into(),
        attributes: vec![],
        prop_type: PropertyType::Texture,
        flags: 0,
        def_value: [0.0; 4],
        def_texture: TextureDefault {
            default_name: "white".into(),
            dimension: TextureDimension::Tex2D,
        },
    }
}

fn parsed_form() -> ShaderAsset {
    let mut state = RenderState::default();
    state.gpu_program_id = 7;
    let pass = NormalPass {
        state,
        programs: ProgramBlocks {
            vertex: vec![
                SubProgramRef {
                    blob_index: 0,
                    program_type: ShaderGpuProgramType::GLES3,
                    hardware_tier: 0,
                },
                SubProgramRef {
                    blob_index: 0,
                    program_type: ShaderGpuProgramType::DX11VertexSM50,
                    hardware_tier: 0,
                },
            ],
            ..ProgramBlocks::default()
        },
    };
    ShaderAsset {
        name: "Test/Unlit".into(),
        properties: vec![main_tex()],
        sub_shaders: vec![SubShader {
            lod: 100,
            tags: vec![("RenderType".into(), "Opaque".into())],
            passes: vec![Pass::Normal(pass)],
        }],
        fallback_name: Some("Diffuse".into()),
        custom_editor_name: None,
    }
}

fn segmented_blob() -> SegmentedBlob {
    let segments = [
        container(&[SubProgramSpec::new(4, GLES_SOURCE.as_bytes()).to_bytes()]),
        container(&[dx11_vertex_spec().to_bytes()]),
    ];
    let mut blob = SegmentedBlob {
        platforms: vec![ShaderCompilerPlatform::GLES3Plus, ShaderCompilerPlatform::D3D11],
        ..SegmentedBlob::default()
    };
    for segment in &segments {
        let packed = lz4_flex::block::compress(segment);
        blob.offsets.push(vec![blob.data.len() as u32]);
        blob.compressed_lengths.push(vec![packed.len() as u32]);
        blob.decompressed_lengths.push(vec![segment.len() as u32]);
        blob.data.extend_from_slice(&packed);
    }
    blob
}

#[test]
fn segmented_shader_emits_every_platform_section() {
    let shader = Shader {
        parsed_form: parsed_form(),
        compressed_blob: Some(segmented_blob()),
        ..Shader::default()
    };
    let text = convert_shader(&shader, &DecodeOptions::default()).unwrap();

    let expected = format!(
        concat!(
            "{header}",
            "Shader \"Test/Unlit\" {{\n",
            "Properties {{\n",
            "_MainTex (\"Base (RGB)\", 2D) = \"white\" {{ }}\n",
            "}}\n",
            "SubShader {{\n",
            " LOD 100\n",
            " Tags {{ \"RenderType\" = \"Opaque\" }}\n",
            " Pass {{\n",
            "  GpuProgramID 7\n",
            "Program \"vp\" {{\n",
            "SubProgram \"gles3 \" {{\n",
            "\"{gles}\"\n",
            "}}\n",
            "SubProgram \"d3d11 \" {{\n",
            "{dx11}\n",
            "}}\n",
            "}}\n",
            "}}\n",
            "}}\n",
            "Fallback \"Diffuse\"\n",
            "}}",
        ),
        header = HEADER,
        gles = GLES_SOURCE,
        dx11 = DX11_VERTEX_EXPORT,
    );
    assert_eq!(text, expected);
}

#[test]
fn uncompressed_segments_are_copied() {
    let segment = container(&[SubProgramSpec::new(4, GLES_SOURCE.as_bytes()).to_bytes()]);
    let mut data = vec![0xEE; 8];
    data.extend_from_slice(&segment);
    let mut asset = parsed_form();
    let Pass::Normal(pass) = &mut asset.sub_shaders[0].passes[0] else {
        unreachable!()
    };
    pass.programs.vertex.truncate(1);

    let shader = Shader {
        parsed_form: asset,
        compressed_blob: Some(SegmentedBlob {
            platforms: vec![ShaderCompilerPlatform::GLES3Plus],
            offsets: vec![vec![8]],
            compressed_lengths: vec![vec![0]],
            decompressed_lengths: vec![vec![segment.len() as u32]],
            data,
        }),
        ..Shader::default()
    };
    let options = DecodeOptions {
        segments_uncompressed: true,
        ..DecodeOptions::default()
    };
    let text = convert_shader(&shader, &options).unwrap();
    assert!(text.contains(&format!("SubProgram \"gles3 \" {{\n\"{GLES_SOURCE}\"\n}}\n")));
}

#[test]
fn legacy_script_substitutes_program_exports() {
    let programs = container(&[
        SubProgramSpec::new(4, b"// first").to_bytes(),
        SubProgramSpec::new(4, b"// second").to_bytes(),
    ]);
    let shader = Shader {
        script: b"Pass {\n  Program \"vp\" {\n    GpuProgramIndex 1\n  }\n}\n".to_vec(),
        sub_program_blob: Some(LegacyBlob {
            data: lz4_flex::block::compress(&programs),
            decompressed_size: programs.len() as u32,
        }),
        ..Shader::default()
    };
    let text = convert_shader(&shader, &DecodeOptions::default()).unwrap();
    assert_eq!(
        text,
        format!("{HEADER}Pass {{\n  Program \"vp\" {{\n    \"// second\"\n  }}\n}}\n")
    );
}

#[test]
fn legacy_blob_with_wrong_size_fails() {
    let programs = container(&[SubProgramSpec::new(4, b"// first").to_bytes()]);
    let shader = Shader {
        script: b"GpuProgramIndex 0".to_vec(),
        sub_program_blob: Some(LegacyBlob {
            data: lz4_flex::block::compress(&programs),
            decompressed_size: programs.len() as u32 + 16,
        }),
        ..Shader::default()
    };
    assert!(convert_shader(&shader, &DecodeOptions::default()).is_err());
}

#[test]
fn missing_blob_index_is_reported() {
    let mut asset = parsed_form();
    let Pass::Normal(pass) = &mut asset.sub_shaders[0].passes[0] else {
        unreachable!()
    };
    pass.programs.vertex[0].blob_index = 3;
    pass.programs.vertex.truncate(1);

    let shader = Shader {
        parsed_form: asset,
        compressed_blob: Some(segmented_blob()),
        ..Shader::default()
    };
    assert!(matches!(
        convert_shader(&shader, &DecodeOptions::default()),
        Err(ShaderError::MissingSubProgram(3))
    ));
}

#[test]
fn script_only_shader_is_passed_through() {
    let shader = Shader {
        script: b"Shader \"Plain\" { }".to_vec(),
        ..Shader::default()
    };
    assert_eq!(
        convert_shader(&shader, &DecodeOptions::default()).unwrap(),
        format!("{HEADER}Shader \"Plain\" {{ }}")
    );
}
