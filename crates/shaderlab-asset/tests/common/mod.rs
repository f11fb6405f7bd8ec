#![allow(dead_code)]

//! Builders for serialized sub-programs and containers.

use shaderlab_dxbc::test_utils::tokens::*;
use shaderlab_dxbc::test_utils::{build_container, build_signature_chunk, SignatureSpec};
use shaderlab_dxbc::FourCC;
use shaderlab_hlsl::opcode::*;

#[derive(Default, Clone)]
pub struct Writer {
    pub bytes: Vec<u8>,
}

impl Writer {
    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn blob(&mut self, b: &[u8]) -> &mut Self {
        self.i32(b.len() as i32);
        self.bytes.extend_from_slice(b);
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        self
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        self.blob(s.as_bytes())
    }

    pub fn strings<S: AsRef<str>>(&mut self, list: &[S]) -> &mut Self {
        self.i32(list.len() as i32);
        for s in list {
            self.string(s.as_ref());
        }
        self
    }
}

pub struct Numeric {
    pub name: &'static str,
    pub ty: i32,
    pub rows: i32,
    pub columns: i32,
    pub matrix: bool,
    pub array_size: i32,
    pub index: i32,
}

pub fn vector(name: &'static str, columns: i32, index: i32) -> Numeric {
    Numeric {
        name,
        ty: 0,
        rows: 1,
        columns,
        matrix: false,
        array_size: 0,
        index,
    }
}

pub fn matrix(name: &'static str, index: i32) -> Numeric {
    Numeric {
        name,
        ty: 0,
        rows: 4,
        columns: 4,
        matrix: true,
        array_size: 0,
        index,
    }
}

pub struct Group {
    pub name: &'static str,
    pub params: Vec<Numeric>,
}

/// Resource binding record; textures (type 0) get a zero multisample word.
pub struct Binding {
    pub name: &'static str,
    pub ty: i32,
    pub index: i32,
    pub extra: i32,
}

/// Serialized sub-program at a version that stores local keywords.
pub struct SubProgramSpec {
    pub program_type: i32,
    pub keywords: Vec<String>,
    pub local_keywords: Vec<String>,
    pub code: Vec<u8>,
    pub source_map: i32,
    pub channels: Vec<(u32, u32)>,
    pub groups: Vec<Group>,
    pub bindings: Vec<Binding>,
}

impl SubProgramSpec {
    pub fn new(program_type: i32, code: &[u8]) -> Self {
        Self {
            program_type,
            keywords: Vec::new(),
            local_keywords: Vec::new(),
            code: code.to_vec(),
            source_map: 0,
            channels: Vec::new(),
            groups: vec![Group {
                name: "",
                params: Vec::new(),
            }],
            bindings: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.i32(201806140).i32(self.program_type);
        w.u32(0).u32(0).u32(0).u32(0);
        w.strings(&self.keywords).strings(&self.local_keywords).blob(&self.code);

        w.i32(self.source_map).i32(self.channels.len() as i32);
        for &(source, target) in &self.channels {
            w.u32(source).u32(target);
        }

        w.i32(self.groups.len() as i32);
        for group in &self.groups {
            w.string(group.name).i32(16 * group.params.len() as i32);
            w.i32(group.params.len() as i32);
            for p in &group.params {
                w.string(p.name)
                    .i32(p.ty)
                    .i32(p.rows)
                    .i32(p.columns)
                    .i32(p.matrix as i32)
                    .i32(p.array_size)
                    .i32(p.index);
            }
            w.i32(0);
        }

        w.i32(self.bindings.len() as i32);
        for b in &self.bindings {
            w.string(b.name).i32(b.ty).i32(b.index).i32(b.extra);
            if b.ty == 0 {
                w.u32(0);
            }
        }
        w.bytes
    }
}

/// Container with one entry per program, all in segment 0.
pub fn container(programs: &[Vec<u8>]) -> Vec<u8> {
    let index_len = 4 + 12 * programs.len();
    let mut w = Writer::default();
    w.i32(programs.len() as i32);
    let mut offset = index_len;
    for p in programs {
        w.i32(offset as i32).i32(p.len() as i32).i32(0);
        offset += p.len();
    }
    for p in programs {
        w.bytes.extend_from_slice(p);
    }
    w.bytes
}

/// DXBC vertex program computing `v.vertex * cb0[0]` with two texcoord
/// outputs packed into one register.
pub fn vertex_dxbc() -> Vec<u8> {
    let mut body = vec![OPCODE_DCL_TEMPS | (2 << 24), 1];
    body.extend(inst(
        OPCODE_MUL,
        &[
            dst(TYPE_TEMP, 0, 0xF),
            src(TYPE_INPUT, 0, SWIZZLE_XYZW),
            cb(0, 0, SWIZZLE_XYZW),
        ],
    ));
    body.extend(inst(
        OPCODE_MOV,
        &[dst(TYPE_OUTPUT, 0, 0xF), src(TYPE_TEMP, 0, SWIZZLE_XYZW)],
    ));
    body.extend(inst(
        OPCODE_MOV,
        &[dst(TYPE_OUTPUT, 1, 0x3), src(TYPE_INPUT, 1, [0, 1, 0, 0])],
    ));
    body.extend(inst(
        OPCODE_MOV,
        &[dst(TYPE_OUTPUT, 1, 0xC), src(TYPE_INPUT, 1, [0, 0, 0, 1])],
    ));
    body.extend(inst(OPCODE_RET, &[]));

    let isgn = build_signature_chunk(&[
        SignatureSpec::new("POSITION", 0, 0, 0xF),
        SignatureSpec::new("TEXCOORD", 0, 1, 0x3),
    ]);
    let osgn = build_signature_chunk(&[
        SignatureSpec::new("SV_POSITION", 0, 0, 0xF).system_value(1),
        SignatureSpec::new("TEXCOORD", 0, 1, 0x3),
        SignatureSpec::new("TEXCOORD", 1, 1, 0xC),
    ]);
    let shdr = program_bytes(1, 5, 0, &body);
    build_container(&[(FourCC::ISGN, &isgn), (FourCC::OSGN, &osgn), (FourCC::SHDR, &shdr)])
}

/// Unity program blob: 6-byte header (version 1) followed by DXBC.
pub fn unity_dx11_code(dxbc: &[u8]) -> Vec<u8> {
    let mut code = vec![1u8, 0, 0, 0, 0, 0];
    code.extend_from_slice(dxbc);
    code
}

/// DX11 vertex sub-program bound to `$Globals` and `UnityPerCamera`.
pub fn dx11_vertex_spec() -> SubProgramSpec {
    let mut spec = SubProgramSpec::new(16, &unity_dx11_code(&vertex_dxbc()));
    spec.keywords = vec!["FOG_LINEAR".to_owned()];
    spec.groups = vec![
        Group {
            name: "",
            params: vec![matrix("_Transform", 0)],
        },
        Group {
            name: "UnityPerCamera",
            params: vec![vector("_Time", 4, 0)],
        },
    ];
    spec.bindings = vec![
        Binding {
            name: "_MainTex",
            ty: 0,
            index: 0,
            extra: 2,
        },
        Binding {
            name: "$Globals",
            ty: 1,
            index: 0,
            extra: 0,
        },
        Binding {
            name: "UnityPerCamera",
            ty: 1,
            index: 1,
            extra: 0,
        },
    ];
    spec
}

pub const DX11_VERTEX_EXPORT: &str = concat!(
    "Keywords { \"FOG_LINEAR\" }\n",
    "\"\"// DX11VertexSM50\n",
    "              #pragma vertex vert\n",
    "            struct appdata_full\n",
    "            {\n",
    "                 vertex : POSITION0;\n",
    "                 texcoord : TEXCOORD0;\n",
    "            };\n",
    "            struct v2f\n",
    "            {\n",
    "                float4 position : SV_POSITION0;\n",
    "                float2 texcoord0 : TEXCOORD0;\n",
    "                float2 texcoord1 : TEXCOORD1;\n",
    "            };\n",
    "            // $Globals ConstantBuffers for Vertex Shader\n",
    "            float4x4 _Transform;\n",
    "            // Custom ConstantBuffers for Vertex Shader\n",
    "            // groupName: UnityPerCamera\n",
    "            CBUFFER_START(UnityPerCamera)\n",
    "                float4 _Time;\n",
    "            CBUFFER_END\n",
    "            // Texture params for Vertex Shader\n",
    "            sampler2D _MainTex;\n",
    "            \n",
    "            // Keywords:  FOG_LINEAR\n",
    "            v2f vert(appdata_full v)\n",
    "            {\n",
    "                v2f o;\n",
    "                float4 tmp0;\n",
    "                tmp0.xyzw = v.vertex.xyzw * _Transform[0].xyzw;\n",
    "                o.position.xyzw = tmp0.xyzw;\n",
    "                o.texcoord0.xy = v.texcoord.xy;\n",
    "                o.texcoord1.xy = v.texcoord.xy;\n",
    "                return o;\n",
    "            }\n",
    "            ENDCG\n",
    "\"\"",
);
