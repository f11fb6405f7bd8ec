use std::fmt;

/// Engine release a shader asset was serialized by, e.g. `2019.4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
}

impl EngineVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parses the leading `major.minor` of strings like `"2019.4.31f1"`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('.');
        let major = leading_number(parts.next()?)?;
        let minor = parts.next().map_or(Some(0), leading_number)?;
        Some(Self { major, minor })
    }

    /// Container index entries carry a segment id from 2019.3 on.
    pub fn has_segment_ids(self) -> bool {
        self >= Self::new(2019, 3)
    }
}

fn leading_number(s: &str) -> Option<u32> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_release_strings() {
        assert_eq!(EngineVersion::parse("2019.4.31f1"), Some(EngineVersion::new(2019, 4)));
        assert_eq!(EngineVersion::parse("5.6.0p3"), Some(EngineVersion::new(5, 6)));
        assert_eq!(EngineVersion::parse("2020"), Some(EngineVersion::new(2020, 0)));
        assert_eq!(EngineVersion::parse("abc"), None);
    }

    #[test]
    fn segment_ids_start_at_2019_3() {
        assert!(!EngineVersion::new(2019, 2).has_segment_ids());
        assert!(EngineVersion::new(2019, 3).has_segment_ids());
        assert!(EngineVersion::new(2020, 1).has_segment_ids());
        assert!(!EngineVersion::new(2018, 4).has_segment_ids());
    }
}
