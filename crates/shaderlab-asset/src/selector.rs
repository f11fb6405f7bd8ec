//! Picks, for each group of sub-program references, the platform that can
//! run it and expands hardware-tier variants.

use tracing::debug;

use crate::asset::SubProgramRef;
use crate::error::Result;
use crate::platform::ShaderCompilerPlatform;

/// One `SubProgram` section to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubProgramSection<'a> {
    /// Index into the asset's platform list (and its decoded programs).
    pub platform_index: usize,
    pub platform: ShaderCompilerPlatform,
    pub reference: &'a SubProgramRef,
    /// Set when the (blob, program type) group has several tier variants.
    pub tier: Option<i32>,
}

impl SubProgramSection<'_> {
    /// Quoted header label, e.g. `d3d11 hw_tier01 `. Negative tiers keep two
    /// digits after the sign (`hw_tier-01`).
    pub fn label(&self) -> String {
        match self.tier {
            Some(tier) if tier < 0 => format!("{} hw_tier{tier:03} ", self.platform.keyword()),
            Some(tier) => format!("{} hw_tier{tier:02} ", self.platform.keyword()),
            None => format!("{} ", self.platform.keyword()),
        }
    }
}

/// Groups `items` by `key`, keeping first-occurrence order for groups and
/// items.
fn group_by<T, K: PartialEq>(items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<Vec<T>> {
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(&item);
        match groups.iter_mut().find(|(g, _)| *g == k) {
            Some((_, group)) => group.push(item),
            None => groups.push((k, vec![item])),
        }
    }
    groups.into_iter().map(|(_, group)| group).collect()
}

/// Resolves the sections of one `Program` block.
pub fn select_sub_programs<'a>(
    refs: &'a [SubProgramRef],
    platforms: &[ShaderCompilerPlatform],
) -> Result<Vec<SubProgramSection<'a>>> {
    let mut sections = Vec::new();
    for blob_group in group_by(refs, |r| r.blob_index) {
        for type_group in group_by(blob_group, |r| r.program_type) {
            let Some(program_type) = type_group.first().map(|r| r.program_type) else {
                continue;
            };
            let mut selected = None;
            for (i, platform) in platforms.iter().enumerate() {
                if platform.accepts(program_type)? {
                    selected = Some((i, *platform));
                    break;
                }
            }
            let Some((platform_index, platform)) = selected else {
                debug!(%program_type, "no platform accepts program type");
                continue;
            };

            let tiered = type_group.len() > 1;
            sections.extend(type_group.into_iter().map(|reference| SubProgramSection {
                platform_index,
                platform,
                reference,
                tier: tiered.then_some(reference.hardware_tier),
            }));
        }
    }
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ShaderError;
    use crate::platform::ShaderGpuProgramType as T;

    fn r(blob_index: u32, program_type: T, hardware_tier: i32) -> SubProgramRef {
        SubProgramRef {
            blob_index,
            program_type,
            hardware_tier,
        }
    }

    #[test]
    fn d3d11_skips_gles_in_shared_blob() {
        let refs = [r(0, T::DX11VertexSM50, 0), r(0, T::GLES, 0)];
        let sections = select_sub_programs(&refs, &[ShaderCompilerPlatform::D3D11]).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].reference.program_type, T::DX11VertexSM50);
        assert_eq!(sections[0].label(), "d3d11 ");
    }

    #[test]
    fn tiers_are_labelled_only_when_several() {
        let refs = [
            r(1, T::GLES3, 0),
            r(1, T::GLES3, 1),
            r(1, T::GLES3, 2),
            r(2, T::GLCore41, 0),
        ];
        let platforms = [ShaderCompilerPlatform::OpenGLCore, ShaderCompilerPlatform::GLES3Plus];
        let sections = select_sub_programs(&refs, &platforms).unwrap();
        let labels: Vec<_> = sections.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec!["gles3 hw_tier00 ", "gles3 hw_tier01 ", "gles3 hw_tier02 ", "glcore "]
        );
        assert_eq!(sections[0].platform_index, 1);
        assert_eq!(sections[3].platform_index, 0);
    }

    #[test]
    fn negative_tier_keeps_two_digits() {
        let refs = [r(0, T::DX11PixelSM50, -1), r(0, T::DX11PixelSM50, 1)];
        let sections = select_sub_programs(&refs, &[ShaderCompilerPlatform::D3D11]).unwrap();
        let labels: Vec<_> = sections.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["d3d11 hw_tier-01 ", "d3d11 hw_tier01 "]);
    }

    #[test]
    fn groups_keep_first_occurrence_order() {
        let refs = [r(3, T::GLES, 0), r(1, T::GLES, 0), r(3, T::GLES, 1)];
        let sections = select_sub_programs(&refs, &[ShaderCompilerPlatform::GLES20]).unwrap();
        let order: Vec<_> = sections.iter().map(|s| (s.reference.blob_index, s.tier)).collect();
        assert_eq!(order, vec![(3, Some(0)), (3, Some(1)), (1, None)]);
    }

    #[test]
    fn unsupported_platform_before_a_match_fails() {
        let refs = [r(0, T::GLES, 0)];
        let platforms = [ShaderCompilerPlatform::Flash, ShaderCompilerPlatform::GLES20];
        assert!(matches!(
            select_sub_programs(&refs, &platforms),
            Err(ShaderError::UnsupportedPlatform(ShaderCompilerPlatform::Flash))
        ));
    }
}
