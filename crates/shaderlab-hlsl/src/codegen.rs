//! HLSL emission for a decoded (and optionally metadata-bound) program.
//!
//! Registers are rendered through the function's structs: inputs as
//! `v.{field}`/`inp.{field}`, outputs as `o.{field}`, temporaries as
//! `tmp{n}`. Output writes are split per signature entry so that packed
//! registers land in the right field.

use shaderlab_dxbc::SignatureEntry;
use tracing::warn;

use crate::ir::{
    BinaryOp, Decl, DstOperand, FunctionStage, Instruction, OperandIndex, OperandModifier,
    RegFile, RegisterRef, RelativeIndex, ResourceDimension, SampleLevel, ShaderIr, SrcKind,
    SrcOperand, TextureRef, UnaryOp,
};
use crate::metadata::ConstantAccess;
use crate::naming::{
    input_field_name, output_field_name, FACING_NAME, FACING_SEMANTIC, FRAGMENT_INPUT_NAME, FRAGMENT_OUTPUT_STRUCT,
    OUTPUT_NAME, TEMP_PREFIX, VERTEX_INPUT_NAME, VERT_TO_FRAG_STRUCT,
};

/// Spaces per indentation level.
pub const INDENT_WIDTH: usize = 4;

const LETTERS: [char; 4] = ['x', 'y', 'z', 'w'];

/// Line-oriented text builder with depth-based indentation.
#[derive(Debug, Clone)]
pub struct HlslWriter {
    out: String,
    depth: usize,
    indent_width: usize,
}

impl HlslWriter {
    pub fn new(depth: usize) -> Self {
        Self::with_indent_width(depth, INDENT_WIDTH)
    }

    pub fn with_indent_width(depth: usize, indent_width: usize) -> Self {
        Self {
            out: String::new(),
            depth,
            indent_width,
        }
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Writes `s` at the current depth followed by a newline.
    pub fn line(&mut self, s: &str) {
        for _ in 0..self.depth * self.indent_width {
            self.out.push(' ');
        }
        self.out.push_str(s);
        self.out.push('\n');
    }

    /// Appends text without indentation or newline.
    pub fn push_raw(&mut self, s: &str) {
        self.out.push_str(s);
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Renders the body of the stage function at `depth`.
pub fn emit_hlsl(ir: &ShaderIr, depth: usize) -> String {
    emit_hlsl_with_indent(ir, depth, INDENT_WIDTH)
}

pub fn emit_hlsl_with_indent(ir: &ShaderIr, depth: usize, indent_width: usize) -> String {
    let mut emitter = Emitter {
        ir,
        w: HlslWriter::with_indent_width(depth, indent_width),
    };
    emitter.emit_locals();
    for inst in &ir.instructions {
        emitter.emit_instruction(inst);
    }
    emitter.w.finish()
}

fn letters(comps: &[u8]) -> String {
    comps.iter().map(|&c| LETTERS[usize::from(c & 3)]).collect()
}

fn vector_type(scalar: &str, n: usize) -> String {
    if n > 1 {
        format!("{scalar}{n}")
    } else {
        scalar.to_owned()
    }
}

/// Renders one 32-bit immediate.
///
/// Small integers are stored as denormal bit patterns, so those print as
/// integers; other finite values print as floats.
fn format_literal(bits: u32) -> String {
    let value = f32::from_bits(bits);
    if value.is_subnormal() {
        format!("{bits}")
    } else if value.is_finite() {
        format!("{value:?}")
    } else {
        format!("asfloat(0x{bits:08x})")
    }
}

fn same_entry(a: Option<&SignatureEntry>, b: Option<&SignatureEntry>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => std::ptr::eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn apply_modifier(expr: String, modifier: OperandModifier) -> String {
    match modifier {
        OperandModifier::None => expr,
        OperandModifier::Neg => format!("-{expr}"),
        OperandModifier::Abs => format!("abs({expr})"),
        OperandModifier::AbsNeg => format!("-abs({expr})"),
    }
}

struct Emitter<'a> {
    ir: &'a ShaderIr,
    w: HlslWriter,
}

impl<'a> Emitter<'a> {
    fn input_prefix(&self) -> &'static str {
        match self.ir.stage {
            FunctionStage::Vertex => VERTEX_INPUT_NAME,
            FunctionStage::Fragment => FRAGMENT_INPUT_NAME,
        }
    }

    fn emit_locals(&mut self) {
        let out_struct = match self.ir.stage {
            FunctionStage::Vertex => VERT_TO_FRAG_STRUCT,
            FunctionStage::Fragment => FRAGMENT_OUTPUT_STRUCT,
        };
        self.w.line(&format!("{out_struct} {OUTPUT_NAME};"));
        for decl in &self.ir.decls {
            if let Decl::IndexableTemp { array, len, .. } = decl {
                self.w.line(&format!("float4 x{array}[{len}];"));
            }
        }
        for i in 0..self.ir.temp_count() {
            self.w.line(&format!("float4 {TEMP_PREFIX}{i};"));
        }
    }

    fn index_expr(&self, index: &OperandIndex) -> String {
        match &index.relative {
            None => index.imm.to_string(),
            Some(rel) => {
                let rel = self.relative_expr(rel);
                if index.imm == 0 {
                    rel
                } else {
                    format!("{rel} + {}", index.imm)
                }
            }
        }
    }

    fn relative_expr(&self, rel: &RelativeIndex) -> String {
        let reg = RegisterRef {
            file: rel.file,
            index: OperandIndex::imm(rel.index),
        };
        self.register_read(&reg, &[rel.component])
    }

    fn signature_entries(&self, file: RegFile) -> (&'a [SignatureEntry], &'static str) {
        match file {
            RegFile::Output | RegFile::OutputDepth => (self.ir.outputs.as_slice(), OUTPUT_NAME),
            _ => (self.ir.inputs.as_slice(), self.input_prefix()),
        }
    }

    fn field_name(&self, file: RegFile, entry: &SignatureEntry) -> String {
        match file {
            RegFile::Output | RegFile::OutputDepth => output_field_name(entry),
            _ => input_field_name(entry),
        }
    }

    /// Splits register components by the signature entry that owns them.
    ///
    /// Each group carries the entry-relative components and the original
    /// lanes they came from.
    fn signature_groups(
        &self,
        file: RegFile,
        register: u32,
        comps: &[u8],
    ) -> Vec<(Option<&'a SignatureEntry>, Vec<u8>, Vec<usize>)> {
        let (entries, _) = self.signature_entries(file);
        let mut groups: Vec<(Option<&'a SignatureEntry>, Vec<u8>, Vec<usize>)> = Vec::new();
        for (pos, &c) in comps.iter().enumerate() {
            let entry = entries
                .iter()
                .find(|e| e.register == register && e.mask & (1 << c) != 0);
            let local = match entry {
                Some(e) => c - e.mask.trailing_zeros() as u8,
                None => c,
            };
            match groups.iter_mut().find(|(g, _, _)| same_entry(*g, entry)) {
                Some((_, locals, lanes)) => {
                    locals.push(local);
                    lanes.push(pos);
                }
                None => groups.push((entry, vec![local], vec![pos])),
            }
        }
        groups
    }

    fn signature_read(&self, file: RegFile, register: u32, comps: &[u8]) -> String {
        let (_, prefix) = self.signature_entries(file);
        let groups = self.signature_groups(file, register, comps);

        let render = |entry: Option<&SignatureEntry>, locals: &[u8]| -> String {
            match entry {
                Some(e) if e.semantic_name == FACING_SEMANTIC => FACING_NAME.to_owned(),
                Some(e) => format!("{prefix}.{}.{}", self.field_name(file, e), letters(locals)),
                None => {
                    warn!(register, ?file, "register component has no signature entry");
                    format!("{prefix}.v{register}.{}", letters(locals))
                }
            }
        };

        if let [(entry, locals, _)] = groups.as_slice() {
            return render(*entry, locals.as_slice());
        }

        // Components gathered from several fields, in lane order.
        let mut parts = vec![String::new(); comps.len()];
        for (entry, locals, lanes) in &groups {
            for (local, &lane) in locals.iter().zip(lanes) {
                parts[lane] = render(*entry, std::slice::from_ref(local));
            }
        }
        format!("{}({})", vector_type("float", comps.len()), parts.join(", "))
    }

    fn depth_field(&self) -> String {
        self.ir
            .outputs
            .iter()
            .find(|e| e.semantic_name.eq_ignore_ascii_case("SV_Depth"))
            .map(output_field_name)
            .unwrap_or_else(|| "depth".to_owned())
    }

    fn register_read(&self, reg: &RegisterRef, comps: &[u8]) -> String {
        match reg.file {
            RegFile::Temp => format!("{TEMP_PREFIX}{}.{}", reg.index.imm, letters(comps)),
            RegFile::IndexableTemp { array } => {
                format!("x{array}[{}].{}", self.index_expr(&reg.index), letters(comps))
            }
            RegFile::Input | RegFile::Output => {
                self.signature_read(reg.file, reg.index.imm, comps)
            }
            RegFile::OutputDepth => format!("{OUTPUT_NAME}.{}", self.depth_field()),
            RegFile::Null => "0".to_owned(),
        }
    }

    fn constant_read(&self, slot: u32, reg: &OperandIndex, comps: &[u8]) -> String {
        if let Some(bindings) = &self.ir.bindings {
            if let Some(access) = bindings.resolve_constant(slot, reg.imm, comps) {
                return self.format_constant(&access, reg);
            }
            warn!(slot, register = reg.imm, "constant buffer lanes left unbound");
        }
        format!("cb{slot}[{}].{}", self.index_expr(reg), letters(comps))
    }

    fn format_constant(&self, access: &ConstantAccess<'_>, reg: &OperandIndex) -> String {
        let member = access.member;
        let swizzle = letters(&access.components);
        if member.is_indexed() {
            let row = match &reg.relative {
                None => access.row.to_string(),
                Some(rel) if access.row == 0 => self.relative_expr(rel),
                Some(rel) => format!("{} + {}", self.relative_expr(rel), access.row),
            };
            format!("{}[{row}].{swizzle}", member.name)
        } else if member.is_scalar() && access.components.len() == 1 {
            member.name.clone()
        } else {
            format!("{}.{swizzle}", member.name)
        }
    }

    fn immediate(&self, values: &[u32; 4], comps: &[u8]) -> String {
        let parts: Vec<String> = comps
            .iter()
            .map(|&c| format_literal(values[usize::from(c & 3)]))
            .collect();
        match parts.as_slice() {
            [single] => single.clone(),
            _ => format!("{}({})", vector_type("float", parts.len()), parts.join(", ")),
        }
    }

    /// Renders `src` for the given destination lanes.
    fn src_expr(&self, src: &SrcOperand, lanes: &[u8]) -> String {
        let comps: Vec<u8> = lanes
            .iter()
            .map(|&l| src.swizzle.0[usize::from(l & 3)])
            .collect();
        let expr = match &src.kind {
            SrcKind::Register(reg) => self.register_read(reg, &comps),
            SrcKind::ConstantBuffer { slot, reg } => self.constant_read(*slot, reg, &comps),
            SrcKind::ImmediateConstantBuffer { reg } => {
                format!("icb[{}].{}", self.index_expr(reg), letters(&comps))
            }
            SrcKind::Immediate(values) => self.immediate(values, &comps),
        };
        apply_modifier(expr, src.modifier)
    }

    fn texture_name(&self, texture: &TextureRef) -> String {
        if let Some(bindings) = &self.ir.bindings {
            if let Some(binding) = bindings.texture(texture.slot) {
                return binding.name.clone();
            }
            warn!(slot = texture.slot, "texture slot has no binding");
        }
        format!("t{}", texture.slot)
    }

    /// Assignment targets for `dst`, paired with the lanes each one covers.
    fn dst_targets(&self, dst: &DstOperand, lanes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let reg = &dst.reg;
        match reg.file {
            RegFile::Output | RegFile::Input => {
                let (_, prefix) = self.signature_entries(reg.file);
                self.signature_groups(reg.file, reg.index.imm, lanes)
                    .into_iter()
                    .map(|(entry, locals, positions)| {
                        let target = match entry {
                            Some(e) => {
                                format!("{prefix}.{}.{}", self.field_name(reg.file, e), letters(&locals))
                            }
                            None => {
                                warn!(register = reg.index.imm, "output component has no signature entry");
                                format!("{prefix}.o{}.{}", reg.index.imm, letters(&locals))
                            }
                        };
                        (target, positions.iter().map(|&p| lanes[p]).collect())
                    })
                    .collect()
            }
            RegFile::OutputDepth => vec![(
                format!("{OUTPUT_NAME}.{}", self.depth_field()),
                lanes.to_vec(),
            )],
            _ => vec![(self.register_read(reg, lanes), lanes.to_vec())],
        }
    }

    fn emit_assign<F>(&mut self, dst: &DstOperand, value: F)
    where
        F: Fn(&Self, &[u8]) -> String,
    {
        let lanes = dst.mask.components();
        if lanes.is_empty() || dst.reg.file == RegFile::Null {
            return;
        }
        for (target, lanes) in self.dst_targets(dst, &lanes) {
            let mut expr = value(&*self, &lanes);
            if dst.saturate {
                expr = format!("saturate({expr})");
            }
            self.w.line(&format!("{target} = {expr};"));
        }
    }

    fn condition(&self, cond: &SrcOperand, nonzero: bool) -> String {
        let op = if nonzero { "!=" } else { "==" };
        format!("{} {op} 0", self.src_expr(cond, &[0]))
    }

    fn sample_call(&self, texture: &TextureRef, coord: &SrcOperand, level: &SampleLevel) -> String {
        let name = self.texture_name(texture);
        let dim = self
            .ir
            .resource_dimension(texture.slot)
            .unwrap_or(ResourceDimension::Texture2D);
        let width = dim.coord_width();
        let coord_lanes: Vec<u8> = (0..width as u8).collect();
        let c = self.src_expr(coord, &coord_lanes);

        let (func, array_macro) = match dim {
            ResourceDimension::Texture1D => ("tex1D", false),
            ResourceDimension::Texture3D => ("tex3D", false),
            ResourceDimension::TextureCube => ("texCUBE", false),
            ResourceDimension::Texture2DArray => ("UNITY_SAMPLE_TEX2DARRAY", true),
            ResourceDimension::TextureCubeArray => ("UNITY_SAMPLE_TEXCUBEARRAY", true),
            _ => ("tex2D", false),
        };

        let padded = |value: String| -> String {
            let zeros = ", 0".repeat(3usize.saturating_sub(width));
            format!("float4({c}{zeros}, {value})")
        };

        match level {
            SampleLevel::Implicit => format!("{func}({name}, {c})"),
            SampleLevel::Lod(lod) if array_macro => {
                format!("{func}_LOD({name}, {c}, {})", self.src_expr(lod, &[0]))
            }
            SampleLevel::Lod(lod) => {
                format!("{func}lod({name}, {})", padded(self.src_expr(lod, &[0])))
            }
            SampleLevel::Bias(bias) if !array_macro && width < 4 => {
                format!("{func}bias({name}, {})", padded(self.src_expr(bias, &[0])))
            }
            SampleLevel::Bias(_) => format!("{func}({name}, {c})"),
        }
    }

    fn unary_expr(&self, op: UnaryOp, src: &SrcOperand, lanes: &[u8]) -> String {
        let a = self.src_expr(src, lanes);
        let n = lanes.len();
        match op {
            UnaryOp::Mov => a,
            UnaryOp::Rcp => format!("1.0 / {a}"),
            UnaryOp::Rsq => format!("rsqrt({a})"),
            UnaryOp::Sqrt => format!("sqrt({a})"),
            UnaryOp::Frc => format!("frac({a})"),
            UnaryOp::Exp => format!("exp2({a})"),
            UnaryOp::Log => format!("log2({a})"),
            UnaryOp::RoundNe => format!("round({a})"),
            UnaryOp::RoundNi => format!("floor({a})"),
            UnaryOp::RoundPi => format!("ceil({a})"),
            UnaryOp::RoundZ => format!("trunc({a})"),
            UnaryOp::Ftoi => format!("{}({a})", vector_type("int", n)),
            UnaryOp::Ftou => format!("{}({a})", vector_type("uint", n)),
            UnaryOp::Itof | UnaryOp::Utof => format!("{}({a})", vector_type("float", n)),
            UnaryOp::Not => format!("~{a}"),
            UnaryOp::INeg => format!("-{a}"),
            UnaryOp::DerivRtx => format!("ddx({a})"),
            UnaryOp::DerivRty => format!("ddy({a})"),
        }
    }

    fn binary_expr(&self, op: BinaryOp, a: &SrcOperand, b: &SrcOperand, lanes: &[u8]) -> String {
        let a = self.src_expr(a, lanes);
        let b = self.src_expr(b, lanes);
        let infix = match op {
            BinaryOp::Add | BinaryOp::IAdd => "+",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt | BinaryOp::ILt | BinaryOp::ULt => "<",
            BinaryOp::Ge | BinaryOp::IGe | BinaryOp::UGe => ">=",
            BinaryOp::Eq | BinaryOp::IEq => "==",
            BinaryOp::Ne | BinaryOp::INe => "!=",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::IShl => "<<",
            BinaryOp::IShr | BinaryOp::UShr => ">>",
            BinaryOp::Min | BinaryOp::IMin | BinaryOp::UMin => return format!("min({a}, {b})"),
            BinaryOp::Max | BinaryOp::IMax | BinaryOp::UMax => return format!("max({a}, {b})"),
        };
        format!("{a} {infix} {b}")
    }

    fn emit_instruction(&mut self, inst: &Instruction) {
        match inst {
            Instruction::Unary { op, dst, src } => {
                self.emit_assign(dst, |e, lanes| e.unary_expr(*op, src, lanes));
            }
            Instruction::Binary { op, dst, a, b } => {
                self.emit_assign(dst, |e, lanes| e.binary_expr(*op, a, b, lanes));
            }
            Instruction::Mad { dst, a, b, c } => {
                self.emit_assign(dst, |e, lanes| {
                    format!(
                        "{} * {} + {}",
                        e.src_expr(a, lanes),
                        e.src_expr(b, lanes),
                        e.src_expr(c, lanes)
                    )
                });
            }
            Instruction::Movc { dst, cond, a, b } => {
                self.emit_assign(dst, |e, lanes| {
                    format!(
                        "{} ? {} : {}",
                        e.src_expr(cond, lanes),
                        e.src_expr(a, lanes),
                        e.src_expr(b, lanes)
                    )
                });
            }
            Instruction::Dot { width, dst, a, b } => {
                let dot_lanes: Vec<u8> = (0..*width).collect();
                self.emit_assign(dst, |e, _| {
                    format!(
                        "dot({}, {})",
                        e.src_expr(a, &dot_lanes),
                        e.src_expr(b, &dot_lanes)
                    )
                });
            }
            Instruction::SinCos { sin, cos, src } => {
                if let Some(sin) = sin {
                    self.emit_assign(sin, |e, lanes| format!("sin({})", e.src_expr(src, lanes)));
                }
                if let Some(cos) = cos {
                    self.emit_assign(cos, |e, lanes| format!("cos({})", e.src_expr(src, lanes)));
                }
            }
            Instruction::Sample {
                dst,
                coord,
                texture,
                level,
                ..
            } => {
                let call = self.sample_call(texture, coord, level);
                self.emit_assign(dst, |_, lanes| {
                    let texel: Vec<u8> = lanes
                        .iter()
                        .map(|&l| texture.swizzle.0[usize::from(l & 3)])
                        .collect();
                    format!("{call}.{}", letters(&texel))
                });
            }
            Instruction::Load {
                dst,
                coord,
                texture,
            } => {
                let name = self.texture_name(texture);
                let width = self
                    .ir
                    .resource_dimension(texture.slot)
                    .unwrap_or(ResourceDimension::Texture2D)
                    .coord_width();
                // Texel coordinate plus mip level.
                let coord_lanes: Vec<u8> = (0..(width + 1).min(4) as u8).collect();
                let c = self.src_expr(coord, &coord_lanes);
                self.emit_assign(dst, |_, lanes| {
                    let texel: Vec<u8> = lanes
                        .iter()
                        .map(|&l| texture.swizzle.0[usize::from(l & 3)])
                        .collect();
                    format!("{name}.Load({c}).{}", letters(&texel))
                });
            }
            Instruction::Discard { cond, nonzero } => {
                let cond = self.condition(cond, *nonzero);
                self.w.line(&format!("if ({cond}) discard;"));
            }
            Instruction::If { cond, nonzero } => {
                let cond = self.condition(cond, *nonzero);
                self.w.line(&format!("if ({cond}) {{"));
                self.w.indent();
            }
            Instruction::Else => {
                self.w.dedent();
                self.w.line("} else {");
                self.w.indent();
            }
            Instruction::EndIf | Instruction::EndLoop => {
                self.w.dedent();
                self.w.line("}");
            }
            Instruction::Loop => {
                self.w.line("while (true) {");
                self.w.indent();
            }
            Instruction::Break => self.w.line("break;"),
            Instruction::BreakC { cond, nonzero } => {
                let cond = self.condition(cond, *nonzero);
                self.w.line(&format!("if ({cond}) break;"));
            }
            Instruction::Continue => self.w.line("continue;"),
            Instruction::Ret => self.w.line(&format!("return {OUTPUT_NAME};")),
            Instruction::Unknown { opcode } => {
                warn!(opcode, "emitting placeholder for unsupported opcode");
                self.w.line(&format!("// unsupported opcode 0x{opcode:02x}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn writer_indents_by_depth() {
        let mut w = HlslWriter::new(1);
        w.line("a");
        w.indent();
        w.line("b");
        w.dedent();
        w.dedent();
        w.dedent();
        w.line("c");
        assert_eq!(w.finish(), "    a\n        b\nc\n");
    }

    #[test]
    fn literals() {
        assert_eq!(format_literal(1.0f32.to_bits()), "1.0");
        assert_eq!(format_literal(0.5f32.to_bits()), "0.5");
        assert_eq!(format_literal(0), "0.0");
        // Integer 3 reinterpreted as a float is a denormal.
        assert_eq!(format_literal(3), "3");
        assert_eq!(format_literal(0xffff_ffff), "asfloat(0xffffffff)");
    }

    #[test]
    fn modifiers() {
        assert_eq!(apply_modifier("a".into(), OperandModifier::Neg), "-a");
        assert_eq!(apply_modifier("a".into(), OperandModifier::Abs), "abs(a)");
        assert_eq!(apply_modifier("a".into(), OperandModifier::AbsNeg), "-abs(a)");
    }

    #[test]
    fn letters_follow_component_order() {
        assert_eq!(letters(&[0, 1, 2, 3]), "xyzw");
        assert_eq!(letters(&[3, 3]), "ww");
    }
}
