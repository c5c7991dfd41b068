use crate::header::Header;
use crate::view::{ByteView, Endian};
use goblin::elf::header::{EI_CLASS, EI_DATA, ELFCLASS32, ELFCLASS64, ELFMAG, SELFMAG, SIZEOF_IDENT};
use goblin::elf::section_header::{SHN_XINDEX, SHT_NOBITS};

/// ELF word size, taken from `e_ident[EI_CLASS]`.
///
/// The two variants carry the only layout differences the scanner cares
/// about: header size, section header size and field offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Elf32,
    Elf64,
}

impl Class {
    pub fn from_ident(class: u8) -> Option<Self> {
        match class {
            ELFCLASS32 => Some(Class::Elf32),
            ELFCLASS64 => Some(Class::Elf64),
            _ => None,
        }
    }

    /// Size of `Elf32_Ehdr` / `Elf64_Ehdr`.
    pub fn header_size(self) -> u64 {
        match self {
            Class::Elf32 => goblin::elf32::header::SIZEOF_EHDR as u64,
            Class::Elf64 => goblin::elf64::header::SIZEOF_EHDR as u64,
        }
    }

    /// Size of `Elf32_Shdr` / `Elf64_Shdr`.
    pub fn section_header_size(self) -> u64 {
        match self {
            Class::Elf32 => goblin::elf32::section_header::SIZEOF_SHDR as u64,
            Class::Elf64 => goblin::elf64::section_header::SIZEOF_SHDR as u64,
        }
    }
}

/// The part of the ELF file header needed to walk the section header table.
///
/// Built only through [`ElfHeader::parse`], which guarantees that the whole
/// table lies inside the parsed bytes.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[derive(Debug, Clone, Copy)]
pub struct ElfHeader {
    /// Word size from `e_ident[EI_CLASS]`.
    pub class: Class,

    /// Byte order from `e_ident[EI_DATA]`.
    pub endian: Endian,

    /// File offset of the section header table.
    pub e_shoff: u64,

    /// Size of one entry in the section header table.
    ///
    /// Never smaller than the class's `Shdr` size.
    pub e_shentsize: u16,

    /// Number of entries in the section header table.
    ///
    /// When the header field is zero, the real count lives in `sh_size` of
    /// section 0 and is stored here instead.
    pub e_shnum: u64,

    /// Index of the section header string table.
    ///
    /// `SHN_XINDEX` in the header is resolved through `sh_link` of section 0.
    pub e_shstrndx: u64,
}

impl ElfHeader {
    /// Parses the header at the start of `data` and validates the placement of
    /// the section header table. Returns `None` for anything that is not an
    /// ELF file with a usable section header table.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let ident = data.get(..SIZEOF_IDENT)?;
        if ident[..SELFMAG] != ELFMAG[..] {
            return None;
        }
        let class = Class::from_ident(ident[EI_CLASS])?;
        let endian = Endian::from_ident(ident[EI_DATA])?;
        let view = ByteView::new(data, endian);
        view.bytes(0, class.header_size())?;

        let (e_shoff, e_shentsize, e_shnum, e_shstrndx) = match class {
            Class::Elf32 => (
                u64::from(view.read_u32_at(32)?),
                view.read_u16_at(46)?,
                view.read_u16_at(48)?,
                view.read_u16_at(50)?,
            ),
            Class::Elf64 => (
                view.read_u64_at(40)?,
                view.read_u16_at(58)?,
                view.read_u16_at(60)?,
                view.read_u16_at(62)?,
            ),
        };

        if e_shoff == 0 || u64::from(e_shentsize) < class.section_header_size() {
            return None;
        }

        let mut header = ElfHeader {
            class,
            endian,
            e_shoff,
            e_shentsize,
            e_shnum: u64::from(e_shnum),
            e_shstrndx: u64::from(e_shstrndx),
        };

        if e_shnum == 0 || u32::from(e_shstrndx) == SHN_XINDEX {
            let first = header.entry(&view, 0)?;
            if e_shnum == 0 {
                header.e_shnum = first.sh_size;
            }
            if u32::from(e_shstrndx) == SHN_XINDEX {
                header.e_shstrndx = u64::from(first.sh_link);
            }
        }

        let table_len = header.e_shnum.checked_mul(u64::from(e_shentsize))?;
        view.bytes(e_shoff, table_len)?;

        Some(header)
    }

    /// Returns section header `index`, or `None` past the end of the table.
    pub fn section(&self, view: &ByteView<'_>, index: u64) -> Option<SectionHeader> {
        if index >= self.e_shnum {
            return None;
        }
        self.entry(view, index)
    }

    fn entry(&self, view: &ByteView<'_>, index: u64) -> Option<SectionHeader> {
        let base = index
            .checked_mul(u64::from(self.e_shentsize))?
            .checked_add(self.e_shoff)?;
        view.bytes(base, self.class.section_header_size())?;

        let at = |field: u64| base + field;
        let sh_name = view.read_u32_at(at(0))?;
        let sh_type = view.read_u32_at(at(4))?;
        let (sh_offset, sh_size, sh_link) = match self.class {
            Class::Elf32 => (
                u64::from(view.read_u32_at(at(16))?),
                u64::from(view.read_u32_at(at(20))?),
                view.read_u32_at(at(24))?,
            ),
            Class::Elf64 => (
                view.read_u64_at(at(24))?,
                view.read_u64_at(at(32))?,
                view.read_u32_at(at(40))?,
            ),
        };

        Some(SectionHeader {
            sh_name,
            sh_type,
            sh_offset,
            sh_size,
            sh_link,
        })
    }
}

impl Header for ElfHeader {
    fn section_header_offset(&self) -> u64 {
        self.e_shoff
    }

    fn section_header_entry_size(&self) -> u64 {
        u64::from(self.e_shentsize)
    }

    fn section_count(&self) -> u64 {
        self.e_shnum
    }

    fn string_table_index(&self) -> u64 {
        self.e_shstrndx
    }

    fn format_name(&self) -> &'static str {
        match self.class {
            Class::Elf32 => "ELF32",
            Class::Elf64 => "ELF64",
        }
    }
}

/// One entry of the section header table, reduced to the fields the note
/// scanner reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Offset of the section name in the section header string table.
    pub sh_name: u32,
    pub sh_type: u32,
    /// File offset of the section contents.
    pub sh_offset: u64,
    /// Size of the section contents in bytes.
    pub sh_size: u64,
    pub sh_link: u32,
}

impl SectionHeader {
    /// Returns the section's bytes, or `None` if they do not lie inside `view`.
    /// `SHT_NOBITS` sections occupy no file space and yield an empty slice.
    pub fn content<'a>(&self, view: &ByteView<'a>) -> Option<&'a [u8]> {
        if self.sh_type == SHT_NOBITS {
            return Some(&[][..]);
        }
        view.bytes(self.sh_offset, self.sh_size)
    }
}
