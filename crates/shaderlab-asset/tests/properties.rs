mod common;

use common::{container, vector, Binding, Group, SubProgramSpec};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use shaderlab_asset::asset::{RenderState, ShaderFloatValue, SubProgramRef};
use shaderlab_asset::{
    select_sub_programs, write_render_state, ByteCursor, DecodeOptions, ShaderCompilerPlatform,
    ShaderGpuProgramType, ShaderProgram, ShaderSubProgram,
};

fn decode(bytes: &[u8]) -> ShaderSubProgram {
    ShaderSubProgram::read(&mut ByteCursor::new(bytes), false).unwrap()
}

fn decode_container(bytes: &[u8]) -> ShaderProgram {
    let mut r = ByteCursor::new(bytes);
    let mut program = ShaderProgram::read_index(&mut r, &DecodeOptions::default()).unwrap();
    program.read_segment(&mut r, 0).unwrap();
    program
}

#[test]
fn default_render_state_writes_only_program_id() {
    assert_eq!(write_render_state(&RenderState::default()), "  GpuProgramID 0\n");
}

#[test]
fn sampler_sentinel_normalizes_to_minus_one() {
    let mut spec = SubProgramSpec::new(4, b"void main() {}");
    spec.bindings = vec![Binding {
        name: "_ShadowMap",
        ty: 0,
        index: 3,
        extra: 0xFFFF_FF00u32 as i32,
    }];
    let sub = decode(&spec.to_bytes());
    let tex = &sub.parameters.textures[0];
    assert_eq!(tex.name, "_ShadowMap");
    assert_eq!(tex.dim, 0);
    assert_eq!(tex.sampler_index, -1);
    assert!(!tex.multisampled);
}

#[test]
fn color_mask_text() {
    let mask = |val: f32| {
        let mut state = RenderState::default();
        state.rt_blend[0].col_mask = ShaderFloatValue::new(val);
        write_render_state(&state)
    };
    assert_eq!(mask(15.0), "  GpuProgramID 0\n");
    assert_eq!(mask(0.0), "  ColorMask 0 0\n  GpuProgramID 0\n");
    assert_eq!(mask(13.0), "  ColorMask GBA 0\n  GpuProgramID 0\n");
    assert_eq!(mask(1.0), "  ColorMask A 0\n  GpuProgramID 0\n");
    assert_eq!(mask(2.0), "  ColorMask R 0\n  GpuProgramID 0\n");
    assert_eq!(mask(14.0), "  ColorMask RGB 0\n  GpuProgramID 0\n");
}

#[test]
fn ztest_less_is_the_only_state_line() {
    let mut state = RenderState::default();
    state.ztest = ShaderFloatValue::new(2.0);
    let text = write_render_state(&state);
    assert_eq!(text.lines().filter(|l| *l == "  ZTest Less").count(), 1);
    for absent in ["ZWrite", "Cull", "Offset", "Stencil", "Fog"] {
        assert!(!text.contains(absent), "{absent} in {text:?}");
    }
}

#[test]
fn d3d11_selects_only_its_program_in_shared_blob() {
    let refs = [
        SubProgramRef {
            blob_index: 0,
            program_type: ShaderGpuProgramType::DX11VertexSM50,
            hardware_tier: 0,
        },
        SubProgramRef {
            blob_index: 0,
            program_type: ShaderGpuProgramType::GLES,
            hardware_tier: 0,
        },
    ];
    let sections = select_sub_programs(&refs, &[ShaderCompilerPlatform::D3D11]).unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(
        sections[0].reference.program_type,
        ShaderGpuProgramType::DX11VertexSM50
    );
    assert_eq!(sections[0].platform_index, 0);
}

fn keyword() -> impl Strategy<Value = String> {
    "[A-Z_]{1,16}"
}

proptest! {
    #[test]
    fn decoding_is_deterministic(
        keywords in prop::collection::vec(keyword(), 0..4),
        local in prop::collection::vec(keyword(), 0..3),
        code in prop::collection::vec(any::<u8>(), 0..64),
        columns in 1i32..=4,
    ) {
        let mut spec = SubProgramSpec::new(4, &code);
        spec.keywords = keywords;
        spec.local_keywords = local;
        spec.groups = vec![Group { name: "", params: vec![vector("_Color", columns, 0)] }];
        let bytes = container(&[spec.to_bytes(), SubProgramSpec::new(5, b"x").to_bytes()]);

        let first = decode_container(&bytes);
        let second = decode_container(&bytes);
        prop_assert_eq!(first.len(), 2);
        for i in 0..first.len() {
            prop_assert_eq!(first.sub_program(i).unwrap(), second.sub_program(i).unwrap());
        }
        prop_assert_eq!(&first.sub_program(0).unwrap().program_code, &code);
    }

    #[test]
    fn source_map_ors_channels_into_seed(seed in any::<i32>()) {
        let mut spec = SubProgramSpec::new(4, b"");
        spec.source_map = seed;
        spec.channels = vec![(0, 0), (2, 3), (5, 1)];
        let sub = decode(&spec.to_bytes());
        prop_assert_eq!(sub.bind_channels.source_map, seed | 0b100101);
        prop_assert_eq!(sub.bind_channels.channels.len(), 3);
    }

    #[test]
    fn group_count_yields_one_fewer_named_buffers(groups in 1usize..8) {
        const NAMES: [&str; 8] = ["", "A", "B", "C", "D", "E", "F", "G"];
        let mut spec = SubProgramSpec::new(4, b"");
        spec.groups = NAMES[..groups]
            .iter()
            .map(|&name| Group { name, params: vec![vector("_V", 4, 0)] })
            .collect();
        let sub = decode(&spec.to_bytes());
        prop_assert_eq!(sub.parameters.constant_buffers.len(), groups - 1);
        prop_assert_eq!(sub.parameters.vector_params.len(), 1);
        let names: Vec<&str> = sub.parameters.constant_buffers.iter().map(|cb| cb.name.as_str()).collect();
        prop_assert_eq!(names, NAMES[1..groups].to_vec());
    }
}
