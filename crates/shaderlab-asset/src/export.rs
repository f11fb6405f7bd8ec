//! Decompiled text for DX11 vertex and pixel sub-programs.

use std::collections::HashSet;

use shaderlab_dxbc::ShaderStage;
use shaderlab_hlsl::naming::{
    format_name, input_field_name, output_field_name, semantic_with_index, FACING_SEMANTIC,
    FRAGMENT_INPUT_NAME, FRAGMENT_OUTPUT_STRUCT, VERTEX_INPUT_NAME, VERTEX_INPUT_STRUCT,
    VERT_TO_FRAG_STRUCT,
};
use shaderlab_hlsl::{DecompileError, Decompiler, HlslWriter};
use tracing::debug;

use crate::error::{Result, ShaderError};
use crate::options::HlslOptions;
use crate::params::{ConstantBuffer, NumericParameter, ParameterTable};
use crate::subprogram::ShaderSubProgram;

/// Offset of the DXBC container inside Unity's DX11 program blob.
pub fn dxbc_offset(code: &[u8]) -> Result<usize> {
    let version = code.first().copied().unwrap_or(0);
    let offset = if version >= 2 { 6 + 0x20 } else { 6 };
    if offset > code.len() {
        return Err(ShaderError::HeaderOutOfRange {
            offset,
            len: code.len(),
        });
    }
    Ok(offset)
}

/// Per-function set of names already declared.
#[derive(Default)]
struct Declarations {
    names: HashSet<String>,
}

impl Declarations {
    fn numeric(&mut self, w: &mut HlslWriter, param: &NumericParameter) {
        if self.names.insert(param.name.clone()) {
            w.line(&param.declaration());
        }
    }

    fn cbuffer(&mut self, w: &mut HlslWriter, cb: &ConstantBuffer) {
        let wrapped = !cb.is_global();
        if wrapped {
            w.line(&format!("CBUFFER_START({})", cb.name));
            w.indent();
        }
        for param in cb.all_numeric_params() {
            self.numeric(w, param);
        }
        if wrapped {
            w.dedent();
            w.line("CBUFFER_END");
        }
    }

    fn all(&mut self, w: &mut HlslWriter, params: &ParameterTable, label: &str) {
        w.line(&format!("// $Globals ConstantBuffers for {label} Shader"));
        for param in params.global_params() {
            self.numeric(w, param);
        }
        if let Some(cb) = params.global_buffer() {
            self.cbuffer(w, cb);
        }

        w.line(&format!("// Custom ConstantBuffers for {label} Shader"));
        for cb in &params.constant_buffers {
            w.line(&format!("// groupName: {}", cb.name));
            self.cbuffer(w, cb);
        }

        w.line(&format!("// Texture params for {label} Shader"));
        for tex in &params.textures {
            if self.names.insert(tex.name.clone()) {
                w.line(&tex.declaration());
            }
        }
    }
}

/// Renders the struct declarations, parameter declarations and decompiled
/// entry point of a DX11 vertex or pixel sub-program.
pub(crate) fn decompiled_program_text(
    sub: &ShaderSubProgram,
    stage: ShaderStage,
    options: &HlslOptions,
) -> Result<String> {
    let code = &sub.program_code;
    let offset = dxbc_offset(code)?;

    let mut decompiler = Decompiler::new();
    decompiler.load(&code[offset..])?;
    let compiled = decompiler
        .compiled()
        .ok_or(DecompileError::Sequencing("load must be called before reading signatures"))?;
    debug!(
        program_type = %sub.program_type,
        inputs = compiled.input_signature.len(),
        outputs = compiled.output_signature.len(),
        "decompiling sub-program"
    );

    let mut out = format!("\"// {}\n  ", sub.program_type);
    let mut w = HlslWriter::with_indent_width(options.declaration_depth, options.indent_width);

    let (label, signature) = match stage {
        ShaderStage::Vertex => {
            w.line("#pragma vertex vert");
            w.line(&format!("struct {VERTEX_INPUT_STRUCT}"));
            w.line("{");
            w.indent();
            for input in &compiled.input_signature {
                w.line(&format!(
                    " {} : {};",
                    input_field_name(input),
                    semantic_with_index(input)
                ));
            }
            w.dedent();
            w.line("};");
            w.line(&format!("struct {VERT_TO_FRAG_STRUCT}"));
            (
                "Vertex",
                format!("{VERT_TO_FRAG_STRUCT} vert({VERTEX_INPUT_STRUCT} {VERTEX_INPUT_NAME})"),
            )
        }
        _ => {
            w.line("#pragma fragment frag");
            w.line(&format!("struct {FRAGMENT_OUTPUT_STRUCT}"));
            let mut args = format!("{VERT_TO_FRAG_STRUCT} {FRAGMENT_INPUT_NAME}");
            if compiled
                .input_signature
                .iter()
                .any(|e| e.semantic_name == FACING_SEMANTIC)
            {
                args.push_str(", float facing: VFACE");
            }
            ("Fragment", format!("{FRAGMENT_OUTPUT_STRUCT} frag({args})"))
        }
    };

    w.line("{");
    w.indent();
    for output in &compiled.output_signature {
        w.line(&format!(
            "{} {} : {};",
            format_name(output),
            output_field_name(output),
            semantic_with_index(output)
        ));
    }
    w.dedent();
    w.line("};");

    Declarations::default().all(&mut w, &sub.parameters, label);
    w.line("");

    let keywords: String = sub.all_keywords().map(|k| format!(" {k}")).collect();
    w.line(&format!("// Keywords: {keywords}"));
    w.line(&signature);
    w.line("{");

    decompiler.build_ir(stage)?;
    if !sub.parameters.constant_buffer_bindings.is_empty() {
        decompiler.apply_metadata(&sub.parameters.binding_metadata())?;
    }
    w.push_raw(&decompiler.emit_with_indent(options.body_depth, options.indent_width)?);

    w.line("}");
    w.line("ENDCG");
    out.push_str(&w.finish());
    out.push('"');
    Ok(out)
}
