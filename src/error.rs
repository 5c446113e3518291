//! Build error taxonomy.

use thiserror::Error;

/// Errors reported by the code-image build pipeline.
///
/// Every failure is fatal to the build in progress; callers must not
/// inspect any output unless the build returned `Ok`.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The input does not carry an ELF magic number.
    #[error("not an ELF file")]
    NotElf,

    /// The input is an ELF, but not a 32-bit little-endian ARM image.
    #[error("not a CTR ARM ELF")]
    NotCtrArm,

    /// The input is a CTR ARM ELF, but not an executable.
    #[error("not an executable ELF")]
    NotExecutable,

    /// No loadable segment with read+execute permissions was found.
    #[error("failed to retrieve the text segment from the ELF")]
    MissingTextSegment,

    /// No loadable segment with read+write permissions was found.
    #[error("failed to retrieve the read-write data segment from the ELF")]
    MissingDataSegment,

    /// The writable data segment claims more file bytes than memory bytes,
    /// which would make its bss size negative.
    #[error("malformed data segment: file size {file_size:#x} exceeds memory size {mem_size:#x}")]
    MalformedDataSegment { file_size: u32, mem_size: u32 },

    /// A program header describes bytes beyond the end of the file.
    #[error("segment data extends beyond the end of the file")]
    SegmentOutOfBounds,

    /// Any other error reported by the ELF reader, forwarded as-is.
    #[error("failed to process ELF file: {0}")]
    Parse(#[from] object::read::Error),
}
