use pretty_assertions::assert_eq;
use shaderlab_asset::params::{
    BindChannels, BufferBinding, NumericParameter, ParameterTable, ShaderParamType,
    TextureParameter,
};
use shaderlab_asset::{HlslOptions, ShaderGpuProgramType, ShaderSubProgram};
use shaderlab_dxbc::test_utils::tokens::*;
use shaderlab_dxbc::test_utils::{build_container, build_signature_chunk, SignatureSpec};
use shaderlab_dxbc::FourCC;
use shaderlab_hlsl::opcode::*;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Samples t0/s0 with the first texcoord and halves the colour of front faces.
fn fragment_dxbc() -> Vec<u8> {
    let mut body = vec![OPCODE_DCL_RESOURCE | (3 << 11) | (4 << 24)];
    body.extend(resource(0));
    body.push(0x5555);
    body.extend(inst(OPCODE_DCL_SAMPLER, &[sampler(0)]));
    body.extend([OPCODE_DCL_TEMPS | (2 << 24), 1]);
    body.extend(inst(
        OPCODE_SAMPLE,
        &[
            dst(TYPE_TEMP, 0, 0xF),
            src(TYPE_INPUT, 1, [0, 1, 0, 0]),
            resource(0),
            sampler(0),
        ],
    ));
    body.extend(inst(
        OPCODE_IF | OPCODE_TEST_NONZERO_BIT,
        &[src_scalar(TYPE_INPUT, 2, 0)],
    ));
    body.extend(inst(
        OPCODE_MUL,
        &[
            dst(TYPE_TEMP, 0, 0x7),
            src(TYPE_TEMP, 0, [0, 1, 2, 0]),
            cb(0, 0, SWIZZLE_XYZW),
        ],
    ));
    body.extend(inst(OPCODE_ENDIF, &[]));
    body.extend(inst(
        OPCODE_MOV,
        &[dst(TYPE_OUTPUT, 0, 0xF), src(TYPE_TEMP, 0, SWIZZLE_XYZW)],
    ));
    body.extend(inst(OPCODE_RET, &[]));

    let isgn = build_signature_chunk(&[
        SignatureSpec::new("SV_POSITION", 0, 0, 0xF).system_value(1),
        SignatureSpec::new("TEXCOORD", 0, 1, 0x3),
        SignatureSpec::new("SV_IsFrontFace", 0, 2, 0x1).system_value(9),
    ]);
    let osgn = build_signature_chunk(&[SignatureSpec::new("SV_Target", 0, 0, 0xF).system_value(64)]);
    let shdr = program_bytes(0, 5, 0, &body);
    build_container(&[(FourCC::ISGN, &isgn), (FourCC::OSGN, &osgn), (FourCC::SHDR, &shdr)])
}

fn pixel_program(version_byte: u8) -> ShaderSubProgram {
    let mut program_code = vec![version_byte, 0, 0, 0, 0, 0];
    if version_byte >= 2 {
        program_code.extend_from_slice(&[0; 0x20]);
    }
    program_code.extend_from_slice(&fragment_dxbc());

    ShaderSubProgram {
        version: 201806140,
        program_type: ShaderGpuProgramType::DX11PixelSM50,
        keywords: vec!["SHADOWS_OFF".to_owned()],
        local_keywords: Some(vec!["_ALPHATEST_ON".to_owned()]),
        program_code,
        bind_channels: BindChannels::default(),
        parameters: ParameterTable {
            vector_params: vec![NumericParameter::vector(
                "_Color".to_owned(),
                ShaderParamType::Float,
                0,
                0,
                4,
            )],
            textures: vec![TextureParameter {
                name: "_MainTex".to_owned(),
                index: 0,
                dim: 2,
                sampler_index: 0,
                multisampled: false,
            }],
            constant_buffer_bindings: vec![BufferBinding {
                name: "$Globals".to_owned(),
                index: 0,
            }],
            ..ParameterTable::default()
        },
    }
}

#[test]
fn pixel_program_exports_bound_names() {
    init_logging();
    let text = pixel_program(1).export().unwrap();
    assert_eq!(
        text,
        concat!(
            "Keywords { \"SHADOWS_OFF\" }\n",
            "Local Keywords { \"_ALPHATEST_ON\" }\n",
            "\"\"// DX11PixelSM50\n",
            "              #pragma fragment frag\n",
            "            struct fout\n",
            "            {\n",
            "                float4 sv_target0 : SV_Target0;\n",
            "            };\n",
            "            // $Globals ConstantBuffers for Fragment Shader\n",
            "            float4 _Color;\n",
            "            // Custom ConstantBuffers for Fragment Shader\n",
            "            // Texture params for Fragment Shader\n",
            "            sampler2D _MainTex;\n",
            "            \n",
            "            // Keywords:  SHADOWS_OFF _ALPHATEST_ON\n",
            "            fout frag(v2f inp, float facing: VFACE)\n",
            "            {\n",
            "                fout o;\n",
            "                float4 tmp0;\n",
            "                tmp0.xyzw = tex2D(_MainTex, inp.texcoord.xy).xyzw;\n",
            "                if (facing != 0) {\n",
            "                    tmp0.xyz = tmp0.xyz * _Color.xyz;\n",
            "                }\n",
            "                o.sv_target0.xyzw = tmp0.xyzw;\n",
            "                return o;\n",
            "            }\n",
            "            ENDCG\n",
            "\"\"",
        )
    );
}

#[test]
fn extended_header_is_skipped() {
    init_logging();
    assert_eq!(
        pixel_program(2).export().unwrap(),
        pixel_program(1).export().unwrap()
    );
}

#[test]
fn unbound_program_keeps_register_names() {
    init_logging();
    let mut sub = pixel_program(1);
    sub.parameters.constant_buffer_bindings.clear();
    let text = sub.export_with(&HlslOptions::default()).unwrap();
    assert!(text.contains("tmp0.xyzw = tex2D(t0, inp.texcoord.xy).xyzw;\n"), "{text}");
    assert!(text.contains("tmp0.xyz = tmp0.xyz * cb0[0].xyz;\n"), "{text}");
    // Declarations are still taken from the parameter table.
    assert!(text.contains("            float4 _Color;\n"), "{text}");
}

#[test]
fn truncated_header_is_an_error() {
    let mut sub = pixel_program(1);
    sub.program_code = vec![3, 0, 0, 0, 0, 0, 0, 0];
    assert!(sub.export().is_err());
}
