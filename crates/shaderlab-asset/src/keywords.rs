//! ShaderLab keywords for enumerated render-state values, indexed by the
//! stored value. Values outside a table fall back to the table's default.

pub static COMPARE_FUNCTION: &[&str] = &[
    "Disabled", "Never", "Less", "Equal", "LEqual", "Greater", "NotEqual", "GEqual", "Always",
];

/// `ZTest` spells the disabled function `Off`.
pub static ZTEST: &[&str] = &[
    "Off", "Never", "Less", "Equal", "LEqual", "Greater", "NotEqual", "GEqual", "Always",
];

pub static CULL: &[&str] = &["Off", "Front", "Back"];

pub static STENCIL_OP: &[&str] = &[
    "Keep", "Zero", "Replace", "IncrSat", "DecrSat", "Invert", "IncrWrap", "DecrWrap",
];

pub static BLEND_OP: &[&str] = &[
    "Add",
    "Sub",
    "RevSub",
    "Min",
    "Max",
    "LogicalClear",
    "LogicalSet",
    "LogicalCopy",
    "LogicalCopyInverted",
    "LogicalNoop",
    "LogicalInvert",
    "LogicalAnd",
    "LogicalNand",
    "LogicalOr",
    "LogicalNor",
    "LogicalXor",
    "LogicalEquiv",
    "LogicalAndReverse",
    "LogicalAndInverted",
    "LogicalOrReverse",
    "LogicalOrInverted",
];

pub static BLEND_FACTOR: &[&str] = &[
    "Zero",
    "One",
    "DstColor",
    "SrcColor",
    "OneMinusDstColor",
    "SrcAlpha",
    "OneMinusSrcColor",
    "DstAlpha",
    "OneMinusDstAlpha",
    "SrcAlphaSaturate",
    "OneMinusSrcAlpha",
];

/// Looks up an integral value; `None` for fractional, negative or
/// out-of-range values.
pub fn lookup(table: &[&'static str], val: f32) -> Option<&'static str> {
    if val < 0.0 || val.fract() != 0.0 {
        return None;
    }
    table.get(val as usize).copied()
}

pub fn ztest(val: f32) -> &'static str {
    lookup(ZTEST, val).unwrap_or("")
}

pub fn cull(val: f32) -> &'static str {
    lookup(CULL, val).unwrap_or("")
}

pub fn stencil_op(val: f32) -> &'static str {
    lookup(STENCIL_OP, val).unwrap_or("Keep")
}

pub fn stencil_comp(val: f32) -> &'static str {
    lookup(COMPARE_FUNCTION, val).unwrap_or("Always")
}

pub fn blend_op(val: f32) -> &'static str {
    lookup(BLEND_OP, val).unwrap_or("Add")
}

pub fn blend_factor(val: f32) -> &'static str {
    lookup(BLEND_FACTOR, val).unwrap_or("One")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_values() {
        assert_eq!(ztest(0.0), "Off");
        assert_eq!(ztest(6.0), "NotEqual");
        assert_eq!(stencil_comp(0.0), "Disabled");
        assert_eq!(blend_factor(10.0), "OneMinusSrcAlpha");
        assert_eq!(blend_op(20.0), "LogicalOrInverted");
        assert_eq!(cull(1.0), "Front");
    }

    #[test]
    fn out_of_range_values_fall_back() {
        assert_eq!(ztest(12.0), "");
        assert_eq!(cull(-1.0), "");
        assert_eq!(stencil_op(2.5), "Keep");
        assert_eq!(stencil_comp(99.0), "Always");
        assert_eq!(blend_op(21.0), "Add");
        assert_eq!(blend_factor(11.0), "One");
    }
}
