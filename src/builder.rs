//! Code-image build pipeline.
//!
//! This module turns a raw ELF into the flat ExeFS ".code" layout:
//! 1. Parse: the program header table is pulled out of the input.
//! 2. Plain region: an optional trailing SDK module-id blob is copied
//!    into its own block-aligned buffer.
//! 3. Code image: the text, read-only data and read-write data segments
//!    are packed into one zero-filled buffer, page-aligned unless
//!    padding is disabled, and the layout metadata is derived.

use crate::elf::{ElfImage, ProgramSegment};
use crate::error::BuildError;
use crate::layout::{classify, CodeLayout, CodeSegment, SegmentKind};
use crate::utils::{align_up, pages_to_size};

/// Build options, normally sourced from the CLI.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Alignment applied to the plain-region buffer. Must be a power
    /// of two.
    pub block_size: u32,
    /// Pack segments back to back instead of page-aligning each one.
    pub no_code_padding: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            block_size: 0x200,
            no_code_padding: false,
        }
    }
}

/// Everything produced by one build: the packed code image, the
/// optional module-id blob, and the layout details consumed by the
/// NCCH header writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub code: Vec<u8>,
    pub plain_region: Option<Vec<u8>>,
    pub layout: CodeLayout,
}

/// Run the whole pipeline over raw ELF bytes.
pub fn build(elf: &[u8], settings: &BuildSettings) -> Result<BuildOutput, BuildError> {
    let image = ElfImage::parse(elf)?;
    tracing::debug!("loaded {} program headers", image.segments().len());

    let plain_region = extract_plain_region(image.segments(), settings.block_size);
    if let Some(region) = &plain_region {
        tracing::info!("imported module-id plain region ({} bytes)", region.len());
    }

    let (code, layout) = build_code(image.segments(), settings)?;
    Ok(BuildOutput {
        code,
        plain_region,
        layout,
    })
}

/// Copy out the trailing SDK module-id segment, if the ELF carries one.
///
/// SDK ELFs append a read-only, non-loadable segment holding the module
/// identifier. A last segment with any other permissions, or with no
/// file bytes, means there is no plain region; that is not an error.
pub fn extract_plain_region(segments: &[ProgramSegment], block_size: u32) -> Option<Vec<u8>> {
    let last = segments.last()?;
    if SegmentKind::masked_flags(last.flags) != SegmentKind::ReadOnlyData.flags() {
        return None;
    }
    if last.file_size == 0 {
        return None;
    }

    let mut buffer = vec![0u8; align_up(last.file_size, block_size) as usize];
    buffer[..last.data.len()].copy_from_slice(last.data);
    Some(buffer)
}

/// Pack the three code segments into one image and derive its layout.
pub fn build_code(
    segments: &[ProgramSegment],
    settings: &BuildSettings,
) -> Result<(Vec<u8>, CodeLayout), BuildError> {
    let kinds = classify(segments);
    let text = select_segment(segments, &kinds, SegmentKind::Text);
    let rodata = select_segment(segments, &kinds, SegmentKind::ReadOnlyData);
    let rwdata = select_segment(segments, &kinds, SegmentKind::ReadWriteData);

    if text.file_size == 0 {
        return Err(BuildError::MissingTextSegment);
    }
    if rwdata.file_size == 0 {
        return Err(BuildError::MissingDataSegment);
    }

    let bss_size = rwdata
        .mem_size
        .checked_sub(rwdata.file_size)
        .ok_or(BuildError::MalformedDataSegment {
            file_size: rwdata.file_size,
            mem_size: rwdata.mem_size,
        })?;

    let (rodata_offset, rwdata_offset, total_size) = if settings.no_code_padding {
        (
            text.file_size,
            text.file_size + rodata.file_size,
            text.file_size + rodata.file_size + rwdata.file_size,
        )
    } else {
        (
            pages_to_size(text.pages),
            pages_to_size(text.pages + rodata.pages),
            pages_to_size(text.pages + rodata.pages + rwdata.pages),
        )
    };

    let mut code = vec![0u8; total_size as usize];
    copy_segment(&mut code, 0, &text);
    copy_segment(&mut code, rodata_offset, &rodata);
    copy_segment(&mut code, rwdata_offset, &rwdata);

    tracing::debug!(
        "packed code image: text={:#x} rodata={:#x} rwdata={:#x} bss={:#x} total={:#x}",
        text.file_size,
        rodata.file_size,
        rwdata.file_size,
        bss_size,
        total_size
    );

    let layout = CodeLayout {
        text: text.info(),
        rodata: rodata.info(),
        rwdata: rwdata.info(),
        bss_size,
    };
    Ok((code, layout))
}

/// Select the first segment classified as `want`.
///
/// Returns an all-zero descriptor when no segment matches; downstream
/// logic treats a zero file size as "segment absent".
fn select_segment<'data>(
    segments: &[ProgramSegment<'data>],
    kinds: &[Option<SegmentKind>],
    want: SegmentKind,
) -> CodeSegment<'data> {
    segments
        .iter()
        .zip(kinds)
        .find(|(_, kind)| **kind == Some(want))
        .map(|(segment, _)| CodeSegment::from_segment(segment))
        .unwrap_or_default()
}

fn copy_segment(code: &mut [u8], offset: u32, segment: &CodeSegment) {
    if segment.file_size == 0 {
        return;
    }
    let offset = offset as usize;
    code[offset..offset + segment.data.len()].copy_from_slice(segment.data);
}
