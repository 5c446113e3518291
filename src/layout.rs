//! Segment classification and output layout metadata.
//!
//! Program headers are matched against the three code-segment
//! categories by their permission flags. The resulting layout details
//! (addresses, page counts, bss size) are what the NCCH extended header
//! records about a code image.

use object::elf;

use crate::elf::ProgramSegment;
use crate::utils::size_to_pages;

/// CTR SDK toolchains set this bit on their program headers; it is
/// ignored when matching permissions.
pub const PF_SDK: u32 = 1 << 28;

/// The three segment categories packed into a code image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    ReadOnlyData,
    ReadWriteData,
}

impl SegmentKind {
    /// The exact permission flags a segment of this kind carries.
    pub fn flags(self) -> u32 {
        match self {
            SegmentKind::Text => elf::PF_R | elf::PF_X,
            SegmentKind::ReadOnlyData => elf::PF_R,
            SegmentKind::ReadWriteData => elf::PF_R | elf::PF_W,
        }
    }

    /// Permission flags with the SDK marker bit cleared.
    pub fn masked_flags(flags: u32) -> u32 {
        flags & !PF_SDK
    }

    fn from_flags(flags: u32) -> Option<Self> {
        let masked = Self::masked_flags(flags);
        [
            SegmentKind::Text,
            SegmentKind::ReadOnlyData,
            SegmentKind::ReadWriteData,
        ]
        .into_iter()
        .find(|kind| kind.flags() == masked)
    }
}

/// Classify every program header, in file order.
///
/// A trailing read-only segment is the SDK `.module_id` blob rather
/// than program data and is never classified; in valid ELFs the last
/// segment is otherwise always read-write data. Segments that are not
/// `PT_LOAD`, or whose masked flags match none of the three categories,
/// classify as `None`.
pub fn classify(segments: &[ProgramSegment]) -> Vec<Option<SegmentKind>> {
    let last = segments.len().checked_sub(1);
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            if Some(index) == last
                && SegmentKind::masked_flags(segment.flags) == SegmentKind::ReadOnlyData.flags()
            {
                return None;
            }
            if !segment.loadable {
                return None;
            }
            SegmentKind::from_flags(segment.flags)
        })
        .collect()
}

/// A code segment selected out of the program header table.
///
/// The data slice borrows from the raw ELF bytes; descriptors only live
/// for the duration of one build. A `file_size` of zero means the
/// segment is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeSegment<'data> {
    /// Virtual load address.
    pub address: u32,
    /// Size in memory.
    pub mem_size: u32,
    /// Size of the segment's bytes in the file.
    pub file_size: u32,
    /// Page count of the on-disk bytes.
    pub pages: u32,
    /// The segment's file bytes.
    pub data: &'data [u8],
}

impl<'data> CodeSegment<'data> {
    pub fn from_segment(segment: &ProgramSegment<'data>) -> Self {
        Self {
            address: segment.vaddr,
            mem_size: segment.mem_size,
            file_size: segment.file_size,
            pages: size_to_pages(segment.file_size),
            data: segment.data,
        }
    }

    /// The layout details recorded for this segment.
    pub fn info(&self) -> SegmentInfo {
        SegmentInfo {
            address: self.address,
            max_pages: self.pages,
            size: self.file_size,
        }
    }
}

/// Per-segment layout details.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentInfo {
    /// Base virtual address.
    pub address: u32,
    /// Page count of the on-disk bytes.
    pub max_pages: u32,
    /// On-disk size in bytes.
    pub size: u32,
}

/// Layout details for a packed code image.
///
/// Built once per code image and handed outward as a value; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeLayout {
    pub text: SegmentInfo,
    pub rodata: SegmentInfo,
    pub rwdata: SegmentInfo,
    /// Bytes of the data segment present in memory but not in the file.
    pub bss_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::ElfImage;
    use crate::testelf::{build_elf, TestSegment};

    #[test]
    fn flags_match_only_exactly() {
        assert_eq!(SegmentKind::from_flags(elf::PF_R | elf::PF_X), Some(SegmentKind::Text));
        assert_eq!(SegmentKind::from_flags(elf::PF_R), Some(SegmentKind::ReadOnlyData));
        assert_eq!(SegmentKind::from_flags(elf::PF_R | elf::PF_W), Some(SegmentKind::ReadWriteData));
        assert_eq!(SegmentKind::from_flags(elf::PF_R | elf::PF_W | elf::PF_X), None);
        assert_eq!(SegmentKind::from_flags(elf::PF_X), None);
    }

    #[test]
    fn sdk_bit_is_masked_off() {
        assert_eq!(
            SegmentKind::from_flags(PF_SDK | elf::PF_R | elf::PF_X),
            Some(SegmentKind::Text)
        );
        assert_eq!(SegmentKind::masked_flags(PF_SDK | elf::PF_R), elf::PF_R);
    }

    #[test]
    fn classification_skips_trailing_read_only_segment() {
        let bytes = build_elf(&[
            TestSegment::load(elf::PF_R | elf::PF_X, 0x0010_0000, 0x100, vec![1; 0x100]),
            TestSegment::load(elf::PF_R | elf::PF_W, 0x0030_0000, 0x80, vec![2; 0x80]),
            TestSegment::load(elf::PF_R, 0x0040_0000, 0x40, vec![3; 0x40]),
        ]);
        let image = ElfImage::parse(&bytes).unwrap();
        let kinds = classify(image.segments());
        assert_eq!(
            kinds,
            vec![
                Some(SegmentKind::Text),
                Some(SegmentKind::ReadWriteData),
                None,
            ]
        );
    }

    #[test]
    fn classification_ignores_non_loadable_segments() {
        let bytes = build_elf(&[
            TestSegment {
                p_type: elf::PT_NOTE,
                flags: elf::PF_R | elf::PF_X,
                vaddr: 0,
                mem_size: 0x20,
                data: vec![0; 0x20],
            },
            TestSegment::load(elf::PF_R | elf::PF_X, 0x0010_0000, 0x100, vec![1; 0x100]),
            TestSegment::load(elf::PF_R | elf::PF_W, 0x0030_0000, 0x80, vec![2; 0x80]),
        ]);
        let image = ElfImage::parse(&bytes).unwrap();
        let kinds = classify(image.segments());
        assert_eq!(
            kinds,
            vec![
                None,
                Some(SegmentKind::Text),
                Some(SegmentKind::ReadWriteData),
            ]
        );
    }
}
