//! Index of the sub-program blobs stored for one platform.

use tracing::debug;

use crate::error::{Result, ShaderError};
use crate::options::DecodeOptions;
use crate::reader::ByteSource;
use crate::subprogram::ShaderSubProgram;
use crate::version::EngineVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubProgramEntry {
    pub offset: i32,
    pub length: i32,
    /// Decompression segment holding the blob; 0 before 2019.3.
    pub segment: i32,
}

impl SubProgramEntry {
    fn read(r: &mut impl ByteSource, version: EngineVersion) -> Result<Self> {
        let offset = r.read_i32_le()?;
        let length = r.read_i32_le()?;
        let segment = if version.has_segment_ids() {
            r.read_i32_le()?
        } else {
            0
        };
        Ok(Self {
            offset,
            length,
            segment,
        })
    }
}

/// Sub-program index of one platform plus the programs decoded so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderProgram {
    pub entries: Vec<SubProgramEntry>,
    sub_programs: Vec<Option<ShaderSubProgram>>,
    has_updated_gpu_program: bool,
}

impl ShaderProgram {
    /// Reads the entry index at the cursor.
    pub fn read_index(r: &mut impl ByteSource, options: &DecodeOptions) -> Result<Self> {
        let count = r.read_len()?;
        let mut entries = Vec::with_capacity(count.min(r.remaining() / 8));
        for _ in 0..count {
            entries.push(SubProgramEntry::read(r, options.engine_version)?);
        }
        debug!(entries = entries.len(), "read sub-program index");
        Ok(Self {
            sub_programs: vec![None; entries.len()],
            entries,
            has_updated_gpu_program: options.has_updated_gpu_program,
        })
    }

    /// Decodes every entry stored in `segment` from that segment's bytes.
    pub fn read_segment(&mut self, r: &mut impl ByteSource, segment: i32) -> Result<()> {
        let mut decoded = 0usize;
        for (entry, slot) in self.entries.iter().zip(self.sub_programs.iter_mut()) {
            if entry.segment != segment {
                continue;
            }
            let offset = usize::try_from(entry.offset).map_err(|_| ShaderError::Truncated {
                expected: entry.offset as u32 as usize,
                actual: r.len(),
            })?;
            r.seek(offset);
            *slot = Some(ShaderSubProgram::read(r, self.has_updated_gpu_program)?);
            decoded += 1;
        }
        debug!(segment, decoded, "decoded segment");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decoded sub-program at blob index `index`.
    pub fn sub_program(&self, index: usize) -> Result<&ShaderSubProgram> {
        self.sub_programs
            .get(index)
            .and_then(Option::as_ref)
            .ok_or(ShaderError::MissingSubProgram(index))
    }

    /// Replaces each `GpuProgramIndex N` in a legacy script with the export
    /// of sub-program N. The index runs to the end of its line.
    pub fn export_legacy_script(&self, script: &str) -> Result<String> {
        const MARKER: &str = "GpuProgramIndex ";

        let mut out = String::with_capacity(script.len());
        let mut rest = script;
        while let Some(start) = rest.find(MARKER) {
            out.push_str(&rest[..start]);
            let after = &rest[start + MARKER.len()..];
            let end = after.find('\n').unwrap_or(after.len());
            let arg = &after[..end];
            if arg.is_empty() {
                out.push_str(MARKER);
                rest = after;
                continue;
            }
            let index: usize = arg
                .trim()
                .parse()
                .map_err(|_| ShaderError::InvalidProgramIndex(arg.to_owned()))?;
            out.push_str(&self.sub_program(index)?.export()?);
            rest = &after[end..];
        }
        out.push_str(rest);
        Ok(out)
    }
}
