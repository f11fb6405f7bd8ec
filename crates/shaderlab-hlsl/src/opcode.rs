//! D3D10/11 tokenized program format constants.
//!
//! Only the opcodes the decoder models are listed; everything else decodes to
//! an unknown instruction and is skipped by length.

pub const OPCODE_MASK: u32 = 0x7ff;
pub const OPCODE_SATURATE_BIT: u32 = 1 << 13;
pub const OPCODE_TEST_NONZERO_BIT: u32 = 1 << 18;
pub const OPCODE_LEN_SHIFT: u32 = 24;
pub const OPCODE_LEN_MASK: u32 = 0x7f;
pub const OPCODE_EXTENDED_BIT: u32 = 1 << 31;
/// `dcl_resource` stores the resource dimension in bits 11..=15.
pub const RESOURCE_DIMENSION_SHIFT: u32 = 11;
pub const RESOURCE_DIMENSION_MASK: u32 = 0x1f;

pub const OPCODE_ADD: u32 = 0x00;
pub const OPCODE_AND: u32 = 0x01;
pub const OPCODE_BREAK: u32 = 0x02;
pub const OPCODE_BREAKC: u32 = 0x03;
pub const OPCODE_CONTINUE: u32 = 0x07;
pub const OPCODE_DERIV_RTX: u32 = 0x0b;
pub const OPCODE_DERIV_RTY: u32 = 0x0c;
pub const OPCODE_DISCARD: u32 = 0x0d;
pub const OPCODE_DIV: u32 = 0x0e;
pub const OPCODE_DP2: u32 = 0x0f;
pub const OPCODE_DP3: u32 = 0x10;
pub const OPCODE_DP4: u32 = 0x11;
pub const OPCODE_ELSE: u32 = 0x12;
pub const OPCODE_ENDIF: u32 = 0x15;
pub const OPCODE_ENDLOOP: u32 = 0x16;
pub const OPCODE_EQ: u32 = 0x18;
pub const OPCODE_EXP: u32 = 0x19;
pub const OPCODE_FRC: u32 = 0x1a;
pub const OPCODE_FTOI: u32 = 0x1b;
pub const OPCODE_FTOU: u32 = 0x1c;
pub const OPCODE_GE: u32 = 0x1d;
pub const OPCODE_IADD: u32 = 0x1e;
pub const OPCODE_IF: u32 = 0x1f;
pub const OPCODE_IEQ: u32 = 0x20;
pub const OPCODE_IGE: u32 = 0x21;
pub const OPCODE_ILT: u32 = 0x22;
pub const OPCODE_IMAD: u32 = 0x23;
pub const OPCODE_IMAX: u32 = 0x24;
pub const OPCODE_IMIN: u32 = 0x25;
pub const OPCODE_INE: u32 = 0x27;
pub const OPCODE_INEG: u32 = 0x28;
pub const OPCODE_ISHL: u32 = 0x29;
pub const OPCODE_ISHR: u32 = 0x2a;
pub const OPCODE_ITOF: u32 = 0x2b;
pub const OPCODE_LD: u32 = 0x2d;
pub const OPCODE_LOG: u32 = 0x2f;
pub const OPCODE_LOOP: u32 = 0x30;
pub const OPCODE_LT: u32 = 0x31;
pub const OPCODE_MAD: u32 = 0x32;
pub const OPCODE_MIN: u32 = 0x33;
pub const OPCODE_MAX: u32 = 0x34;
pub const OPCODE_CUSTOMDATA: u32 = 0x35;
pub const OPCODE_MOV: u32 = 0x36;
pub const OPCODE_MOVC: u32 = 0x37;
pub const OPCODE_MUL: u32 = 0x38;
pub const OPCODE_NE: u32 = 0x39;
pub const OPCODE_NOP: u32 = 0x3a;
pub const OPCODE_NOT: u32 = 0x3b;
pub const OPCODE_OR: u32 = 0x3c;
pub const OPCODE_RET: u32 = 0x3e;
pub const OPCODE_ROUND_NE: u32 = 0x40;
pub const OPCODE_ROUND_NI: u32 = 0x41;
pub const OPCODE_ROUND_PI: u32 = 0x42;
pub const OPCODE_ROUND_Z: u32 = 0x43;
pub const OPCODE_RSQ: u32 = 0x44;
pub const OPCODE_SAMPLE: u32 = 0x45;
pub const OPCODE_SAMPLE_L: u32 = 0x48;
pub const OPCODE_SAMPLE_B: u32 = 0x4a;
pub const OPCODE_SQRT: u32 = 0x4b;
pub const OPCODE_SINCOS: u32 = 0x4d;
pub const OPCODE_ULT: u32 = 0x4f;
pub const OPCODE_UGE: u32 = 0x50;
pub const OPCODE_UMAX: u32 = 0x53;
pub const OPCODE_UMIN: u32 = 0x54;
pub const OPCODE_USHR: u32 = 0x55;
pub const OPCODE_UTOF: u32 = 0x56;
pub const OPCODE_XOR: u32 = 0x57;
pub const OPCODE_RCP: u32 = 0x81;

pub const OPCODE_DCL_RESOURCE: u32 = 0x58;
pub const OPCODE_DCL_CONSTANT_BUFFER: u32 = 0x59;
pub const OPCODE_DCL_SAMPLER: u32 = 0x5a;
pub const OPCODE_DCL_INPUT: u32 = 0x5f;
pub const OPCODE_DCL_INPUT_PS_SIV: u32 = 0x64;
pub const OPCODE_DCL_OUTPUT_SIV: u32 = 0x67;
pub const OPCODE_DCL_TEMPS: u32 = 0x68;
pub const OPCODE_DCL_INDEXABLE_TEMP: u32 = 0x69;
pub const OPCODE_DCL_GLOBAL_FLAGS: u32 = 0x6a;

/// Returns true for opcodes that only declare state.
pub fn is_declaration(opcode: u32) -> bool {
    matches!(opcode, 0x58..=0x6a | 0x8f..=0xa2 | 0xce)
}

pub const OPERAND_NUM_COMPONENTS_MASK: u32 = 0x3;
pub const OPERAND_SELECTION_MODE_SHIFT: u32 = 2;
pub const OPERAND_SELECTION_MODE_MASK: u32 = 0x3;
pub const OPERAND_COMPONENT_SELECTION_SHIFT: u32 = 4;
pub const OPERAND_COMPONENT_SELECTION_MASK: u32 = 0xff;
pub const OPERAND_TYPE_SHIFT: u32 = 12;
pub const OPERAND_TYPE_MASK: u32 = 0xff;
pub const OPERAND_INDEX_DIMENSION_SHIFT: u32 = 20;
pub const OPERAND_INDEX_DIMENSION_MASK: u32 = 0x3;
pub const OPERAND_INDEX0_REP_SHIFT: u32 = 22;
pub const OPERAND_INDEX_REP_BITS: u32 = 3;
pub const OPERAND_INDEX_REP_MASK: u32 = 0x7;
pub const OPERAND_EXTENDED_BIT: u32 = 1 << 31;

pub const OPERAND_SEL_MASK: u32 = 0;
pub const OPERAND_SEL_SWIZZLE: u32 = 1;
pub const OPERAND_SEL_SELECT1: u32 = 2;

pub const OPERAND_INDEX_REP_IMMEDIATE32: u32 = 0;
pub const OPERAND_INDEX_REP_RELATIVE: u32 = 2;
pub const OPERAND_INDEX_REP_IMMEDIATE32_PLUS_RELATIVE: u32 = 3;

pub const EXTENDED_OPERAND_MODIFIER: u32 = 1;

pub const OPERAND_TYPE_TEMP: u32 = 0;
pub const OPERAND_TYPE_INPUT: u32 = 1;
pub const OPERAND_TYPE_OUTPUT: u32 = 2;
pub const OPERAND_TYPE_INDEXABLE_TEMP: u32 = 3;
pub const OPERAND_TYPE_IMMEDIATE32: u32 = 4;
pub const OPERAND_TYPE_SAMPLER: u32 = 6;
pub const OPERAND_TYPE_RESOURCE: u32 = 7;
pub const OPERAND_TYPE_CONSTANT_BUFFER: u32 = 8;
pub const OPERAND_TYPE_IMMEDIATE_CONSTANT_BUFFER: u32 = 9;
pub const OPERAND_TYPE_OUTPUT_DEPTH: u32 = 12;
pub const OPERAND_TYPE_NULL: u32 = 13;
