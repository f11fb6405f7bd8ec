//! Compiler platforms, GPU program types and the table of which program
//! types each platform can run.

use std::fmt;

use shaderlab_dxbc::ShaderStage;

use crate::error::{Result, ShaderError};

macro_rules! raw_enum {
    (@name $variant:ident $text:literal) => { $text };
    (@name $variant:ident) => { stringify!($variant) };
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident = $value:literal $(=> $text:literal)?,)* }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
            Unknown(i32),
        }

        impl $name {
            pub fn from_raw(raw: i32) -> Self {
                match raw {
                    $($value => Self::$variant,)*
                    other => Self::Unknown(other),
                }
            }

            pub fn raw(self) -> i32 {
                match self {
                    $(Self::$variant => $value,)*
                    Self::Unknown(other) => other,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str(raw_enum!(@name $variant $($text)?)),)*
                    Self::Unknown(other) => write!(f, "{other}"),
                }
            }
        }
    };
}

raw_enum! {
    pub enum ShaderCompilerPlatform {
        GL = 0,
        D3D9 = 1,
        Xbox360 = 2,
        PS3 = 3,
        D3D11 = 4,
        GLES20 = 5,
        NaCl = 6,
        Flash = 7,
        D3D11_9x = 8,
        GLES3Plus = 9,
        PSP2 = 10,
        PS4 = 11,
        XboxOne = 12,
        PSM = 13,
        Metal = 14,
        OpenGLCore = 15,
        N3DS = 16,
        WiiU = 17,
        Vulkan = 18,
        Switch = 19,
        XboxOneD3D12 = 20,
        GameCoreXboxOne = 21,
        GameCoreScarlett = 22,
        PS5 = 23,
        PS5NGGC = 24,
    }
}

raw_enum! {
    pub enum ShaderGpuProgramType {
        Unused = 0 => "Unknown",
        GLLegacy = 1,
        GLES31AEP = 2,
        GLES31 = 3,
        GLES3 = 4,
        GLES = 5,
        GLCore32 = 6,
        GLCore41 = 7,
        GLCore43 = 8,
        DX9VertexSM20 = 9,
        DX9VertexSM30 = 10,
        DX9PixelSM20 = 11,
        DX9PixelSM30 = 12,
        DX10Level9Vertex = 13,
        DX10Level9Pixel = 14,
        DX11VertexSM40 = 15,
        DX11VertexSM50 = 16,
        DX11PixelSM40 = 17,
        DX11PixelSM50 = 18,
        DX11GeometrySM40 = 19,
        DX11GeometrySM50 = 20,
        DX11HullSM50 = 21,
        DX11DomainSM50 = 22,
        MetalVS = 23,
        MetalFS = 24,
        SPIRV = 25,
        ConsoleVS = 26,
        ConsoleFS = 27,
        ConsoleHS = 28,
        ConsoleDS = 29,
        ConsoleGS = 30,
        RayTracing = 31,
        PS5NGGC = 32,
    }
}

use ShaderCompilerPlatform as P;
use ShaderGpuProgramType as T;

const CONSOLE: &[T] = &[T::ConsoleVS, T::ConsoleFS, T::ConsoleHS, T::ConsoleDS, T::ConsoleGS];

/// Program types each platform accepts. Platforms missing from this table
/// cannot host any sub-program.
static COMPATIBILITY: &[(P, &[T])] = &[
    (P::GL, &[T::GLLegacy]),
    (P::D3D9, &[T::DX9VertexSM20, T::DX9VertexSM30, T::DX9PixelSM20, T::DX9PixelSM30]),
    (P::Xbox360, CONSOLE),
    (P::PS3, CONSOLE),
    (P::PSP2, CONSOLE),
    (P::PS4, CONSOLE),
    (P::XboxOne, CONSOLE),
    (P::N3DS, CONSOLE),
    (P::WiiU, CONSOLE),
    (P::Switch, CONSOLE),
    (P::XboxOneD3D12, CONSOLE),
    (P::GameCoreXboxOne, CONSOLE),
    (P::GameCoreScarlett, CONSOLE),
    (P::PS5, CONSOLE),
    (P::PS5NGGC, &[T::PS5NGGC]),
    (
        P::D3D11,
        &[
            T::DX11VertexSM40,
            T::DX11VertexSM50,
            T::DX11PixelSM40,
            T::DX11PixelSM50,
            T::DX11GeometrySM40,
            T::DX11GeometrySM50,
            T::DX11HullSM50,
            T::DX11DomainSM50,
        ],
    ),
    (P::GLES20, &[T::GLES]),
    (P::D3D11_9x, &[T::DX10Level9Vertex, T::DX10Level9Pixel]),
    (P::GLES3Plus, &[T::GLES31AEP, T::GLES31, T::GLES3]),
    (P::Metal, &[T::MetalVS, T::MetalFS]),
    (P::OpenGLCore, &[T::GLCore32, T::GLCore41, T::GLCore43]),
    (P::Vulkan, &[T::SPIRV]),
];

impl ShaderCompilerPlatform {
    /// Whether sub-programs of `program_type` belong to this platform.
    pub fn accepts(self, program_type: ShaderGpuProgramType) -> Result<bool> {
        COMPATIBILITY
            .iter()
            .find(|(platform, _)| *platform == self)
            .map(|(_, types)| types.contains(&program_type))
            .ok_or(ShaderError::UnsupportedPlatform(self))
    }

    /// Platform keyword used in `SubProgram "..."` headers.
    pub fn keyword(self) -> &'static str {
        match self {
            P::GL => "openGL",
            P::D3D9 => "d3d9",
            P::Xbox360 => "xbox360",
            P::PS3 => "ps3",
            P::D3D11 => "d3d11",
            P::GLES20 => "gles",
            P::NaCl => "glesdesktop",
            P::Flash => "flash",
            P::D3D11_9x => "d3d11_9x",
            P::GLES3Plus => "gles3",
            P::PSP2 => "psp2",
            P::PS4 => "ps4",
            P::XboxOne | P::GameCoreXboxOne => "xboxone",
            P::PSM => "psm",
            P::Metal => "metal",
            P::OpenGLCore => "glcore",
            P::N3DS => "n3ds",
            P::WiiU => "wiiu",
            P::Vulkan => "vulkan",
            P::Switch => "switch",
            P::XboxOneD3D12 => "xboxone_d3d12",
            P::GameCoreScarlett => "xbox_scarlett",
            P::PS5 => "ps5",
            P::PS5NGGC => "ps5_nggc",
            P::Unknown(_) => "unknown",
        }
    }
}

impl ShaderGpuProgramType {
    /// Stage to decompile DXBC bytecode as, for the program types that carry
    /// decompilable SM4/SM5 vertex or pixel code.
    pub fn decompile_stage(self) -> Option<ShaderStage> {
        match self {
            T::DX10Level9Vertex | T::DX11VertexSM40 | T::DX11VertexSM50 => Some(ShaderStage::Vertex),
            // Level 9 pixel code carries a pixel version token, so it is decoded as one.
            T::DX10Level9Pixel | T::DX11PixelSM40 | T::DX11PixelSM50 => Some(ShaderStage::Pixel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_round_trip_and_keep_unknowns() {
        assert_eq!(T::from_raw(16), T::DX11VertexSM50);
        assert_eq!(T::DX11VertexSM50.raw(), 16);
        assert_eq!(P::from_raw(99), P::Unknown(99));
        assert_eq!(P::Unknown(99).raw(), 99);
        assert_eq!(T::from_raw(25).to_string(), "SPIRV");
        assert_eq!(T::from_raw(77).to_string(), "77");
        assert_eq!(T::from_raw(0).to_string(), "Unknown");
    }

    #[test]
    fn d3d11_accepts_only_dx11_types() {
        assert!(P::D3D11.accepts(T::DX11VertexSM50).unwrap());
        assert!(P::D3D11.accepts(T::DX11DomainSM50).unwrap());
        assert!(!P::D3D11.accepts(T::GLES).unwrap());
        assert!(!P::D3D11.accepts(T::DX10Level9Vertex).unwrap());
    }

    #[test]
    fn obsolete_and_unknown_platforms_are_unsupported() {
        for platform in [P::NaCl, P::Flash, P::PSM, P::Unknown(40)] {
            assert!(matches!(
                platform.accepts(T::GLES),
                Err(ShaderError::UnsupportedPlatform(p)) if p == platform
            ));
        }
    }

    #[test]
    fn keywords() {
        assert_eq!(P::GL.keyword(), "openGL");
        assert_eq!(P::GameCoreXboxOne.keyword(), "xboxone");
        assert_eq!(P::GameCoreScarlett.keyword(), "xbox_scarlett");
        assert_eq!(P::Unknown(-3).keyword(), "unknown");
    }

    #[test]
    fn only_dx_vertex_and_pixel_types_decompile() {
        assert_eq!(T::DX11PixelSM40.decompile_stage(), Some(ShaderStage::Pixel));
        assert_eq!(T::DX10Level9Vertex.decompile_stage(), Some(ShaderStage::Vertex));
        assert_eq!(T::DX10Level9Pixel.decompile_stage(), Some(ShaderStage::Pixel));
        assert_eq!(T::DX11GeometrySM50.decompile_stage(), None);
        assert_eq!(T::MetalVS.decompile_stage(), None);
    }
}
