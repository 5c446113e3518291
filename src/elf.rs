//! Program-header extraction.
//!
//! A thin wrapper over the `object` crate's low-level ELF reader.
//! Inputs are 32-bit little-endian ARM executables; everything the
//! build pipeline needs from the file is captured into `ProgramSegment`
//! views that borrow from the raw input bytes.

use object::elf;
use object::read::elf::{FileHeader, ProgramHeader};
use object::LittleEndian;

use crate::error::BuildError;

/// Index of the file-class byte within the ELF identification bytes.
const EI_CLASS: usize = 4;

/// One entry of the program header table.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSegment<'data> {
    /// Virtual load address.
    pub vaddr: u32,
    /// Size in memory, including any zero-filled tail.
    pub mem_size: u32,
    /// Size of the segment's bytes in the file.
    pub file_size: u32,
    /// Raw permission flags from the program header.
    pub flags: u32,
    /// Whether the header type is `PT_LOAD`.
    pub loadable: bool,
    /// The segment's file bytes.
    pub data: &'data [u8],
}

/// A validated input executable.
#[derive(Debug)]
pub struct ElfImage<'data> {
    segments: Vec<ProgramSegment<'data>>,
}

impl<'data> ElfImage<'data> {
    /// Parse and validate raw ELF bytes.
    ///
    /// The file header is checked up front so that the classic failure
    /// modes (not an ELF, wrong architecture, not an executable) are
    /// reported distinctly; anything else the reader rejects is
    /// forwarded unchanged.
    pub fn parse(data: &'data [u8]) -> Result<Self, BuildError> {
        if data.get(..4) != Some(&elf::ELFMAG[..]) {
            return Err(BuildError::NotElf);
        }
        if data.get(EI_CLASS).copied() != Some(elf::ELFCLASS32) {
            return Err(BuildError::NotCtrArm);
        }

        let header = elf::FileHeader32::<LittleEndian>::parse(data)?;
        let endian = header.endian().map_err(|_| BuildError::NotCtrArm)?;
        if header.e_machine.get(endian) != elf::EM_ARM {
            return Err(BuildError::NotCtrArm);
        }
        if header.e_type.get(endian) != elf::ET_EXEC {
            return Err(BuildError::NotExecutable);
        }

        let mut segments = Vec::new();
        for ph in header.program_headers(endian, data)? {
            let bytes = ph
                .data(endian, data)
                .map_err(|()| BuildError::SegmentOutOfBounds)?;
            segments.push(ProgramSegment {
                vaddr: ph.p_vaddr(endian),
                mem_size: ph.p_memsz(endian),
                file_size: ph.p_filesz(endian),
                flags: ph.p_flags(endian),
                loadable: ph.p_type(endian) == elf::PT_LOAD,
                data: bytes,
            });
        }

        Ok(Self { segments })
    }

    /// The program header table, in file order.
    pub fn segments(&self) -> &[ProgramSegment<'data>] {
        &self.segments
    }
}
