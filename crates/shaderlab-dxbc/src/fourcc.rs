use core::fmt;

/// A four-character chunk identifier such as `SHDR` or `ISGN`.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Input signature.
    pub const ISGN: FourCC = FourCC(*b"ISGN");
    /// Input signature, 32-byte entry variant.
    pub const ISG1: FourCC = FourCC(*b"ISG1");
    /// Output signature.
    pub const OSGN: FourCC = FourCC(*b"OSGN");
    /// Output signature, 32-byte entry variant.
    pub const OSG1: FourCC = FourCC(*b"OSG1");
    /// Output signature emitted by SM5 compilers.
    pub const OSG5: FourCC = FourCC(*b"OSG5");
    /// Shader model 4 program.
    pub const SHDR: FourCC = FourCC(*b"SHDR");
    /// Shader model 5 program.
    pub const SHEX: FourCC = FourCC(*b"SHEX");
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{self}\")")
    }
}
