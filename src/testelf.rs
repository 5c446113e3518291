//! Helpers for constructing synthetic CTR ELF images in unit tests.

use object::elf;
use object::endian::{U16, U32};
use object::pod::bytes_of;
use object::LittleEndian as LE;

const EHSIZE: u32 = 52;
const PHENTSIZE: u32 = 32;

/// One program header plus its file bytes.
pub struct TestSegment {
    pub p_type: u32,
    pub flags: u32,
    pub vaddr: u32,
    pub mem_size: u32,
    pub data: Vec<u8>,
}

impl TestSegment {
    /// A `PT_LOAD` segment.
    pub fn load(flags: u32, vaddr: u32, mem_size: u32, data: Vec<u8>) -> Self {
        Self {
            p_type: elf::PT_LOAD,
            flags,
            vaddr,
            mem_size,
            data,
        }
    }
}

fn u16v(v: u16) -> U16<LE> {
    U16::new(LE, v)
}
fn u32v(v: u32) -> U32<LE> {
    U32::new(LE, v)
}

/// Serialize a minimal 32-bit ARM executable with the given segments.
pub fn build_elf(segments: &[TestSegment]) -> Vec<u8> {
    build_elf_with(elf::EM_ARM, elf::ET_EXEC, segments)
}

/// Same as `build_elf`, with the machine and file type chosen freely.
pub fn build_elf_with(machine: u16, e_type: u16, segments: &[TestSegment]) -> Vec<u8> {
    let phoff = EHSIZE;
    let data_start = phoff + PHENTSIZE * segments.len() as u32;

    let header = elf::FileHeader32::<LE> {
        e_ident: elf::Ident {
            magic: elf::ELFMAG,
            class: elf::ELFCLASS32,
            data: elf::ELFDATA2LSB,
            version: elf::EV_CURRENT,
            os_abi: elf::ELFOSABI_NONE,
            abi_version: 0,
            padding: [0; 7],
        },
        e_type: u16v(e_type),
        e_machine: u16v(machine),
        e_version: u32v(elf::EV_CURRENT as u32),
        e_entry: u32v(0x0010_0000),
        e_phoff: u32v(phoff),
        e_shoff: u32v(0),
        e_flags: u32v(0),
        e_ehsize: u16v(EHSIZE as u16),
        e_phentsize: u16v(PHENTSIZE as u16),
        e_phnum: u16v(segments.len() as u16),
        e_shentsize: u16v(0),
        e_shnum: u16v(0),
        e_shstrndx: u16v(0),
    };

    let mut buffer = Vec::new();
    buffer.extend_from_slice(bytes_of(&header));

    let mut offset = data_start;
    for segment in segments {
        let ph = elf::ProgramHeader32::<LE> {
            p_type: u32v(segment.p_type),
            p_offset: u32v(offset),
            p_vaddr: u32v(segment.vaddr),
            p_paddr: u32v(segment.vaddr),
            p_filesz: u32v(segment.data.len() as u32),
            p_memsz: u32v(segment.mem_size),
            p_flags: u32v(segment.flags),
            p_align: u32v(0x1000),
        };
        buffer.extend_from_slice(bytes_of(&ph));
        offset += segment.data.len() as u32;
    }

    for segment in segments {
        buffer.extend_from_slice(&segment.data);
    }
    buffer
}
