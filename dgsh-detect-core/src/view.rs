use anyhow::{bail, Context, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use goblin::elf::header::{ELFDATA2LSB, ELFDATA2MSB};
use memmap2::Mmap;
use std::path::Path;

/// Read-only mapping of one candidate program, owned by the check that
/// loaded it.
///
/// The descriptor is closed once the mapping exists and the mapping is
/// released when the view is dropped, so no exit path of a check can leak
/// either.
#[derive(Debug)]
pub struct FileView {
    map: Mmap,
}

impl FileView {
    /// Maps the whole file at `path`.
    ///
    /// Fails when the file cannot be opened, is not a regular file, is empty,
    /// or cannot be mapped. An empty file is rejected before any mapping is
    /// attempted.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        let metadata = file
            .metadata()
            .with_context(|| format!("cannot stat {}", path.display()))?;
        if !metadata.is_file() {
            bail!("{} is not a regular file", path.display());
        }
        if metadata.len() == 0 {
            bail!("{} is empty", path.display());
        }

        // SAFETY: the mapping is read-only and only ever read through
        // bounds-checked slices of its own length.
        let map = unsafe { Mmap::map(&file) }
            .with_context(|| format!("cannot map {}", path.display()))?;

        Ok(Self { map })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.map
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Byte order of multi-byte fields, taken from `e_ident[EI_DATA]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub fn from_ident(data: u8) -> Option<Self> {
        match data {
            ELFDATA2LSB => Some(Endian::Little),
            ELFDATA2MSB => Some(Endian::Big),
            _ => None,
        }
    }
}

/// Range-checked reader over untrusted bytes.
///
/// Every accessor takes an offset that may come straight from file content
/// and returns `None` instead of reading past the end or overflowing.
#[derive(Debug, Clone, Copy)]
pub struct ByteView<'a> {
    data: &'a [u8],
    endian: Endian,
}

impl<'a> ByteView<'a> {
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self { data, endian }
    }

    /// Returns `len` bytes starting at `offset`, if all of them are inside the view.
    pub fn bytes(&self, offset: u64, len: u64) -> Option<&'a [u8]> {
        let start = usize::try_from(offset).ok()?;
        let len = usize::try_from(len).ok()?;
        let end = start.checked_add(len)?;
        self.data.get(start..end)
    }

    pub fn read_u16_at(&self, offset: u64) -> Option<u16> {
        let raw = self.bytes(offset, 2)?;
        Some(match self.endian {
            Endian::Little => LittleEndian::read_u16(raw),
            Endian::Big => BigEndian::read_u16(raw),
        })
    }

    pub fn read_u32_at(&self, offset: u64) -> Option<u32> {
        let raw = self.bytes(offset, 4)?;
        Some(match self.endian {
            Endian::Little => LittleEndian::read_u32(raw),
            Endian::Big => BigEndian::read_u32(raw),
        })
    }

    pub fn read_u64_at(&self, offset: u64) -> Option<u64> {
        let raw = self.bytes(offset, 8)?;
        Some(match self.endian {
            Endian::Little => LittleEndian::read_u64(raw),
            Endian::Big => BigEndian::read_u64(raw),
        })
    }
}

/// Returns the NUL-terminated run starting at `offset` in `table`, without the
/// terminator. Offsets past the table and runs with no terminator yield `None`.
pub fn cstr_at(table: &[u8], offset: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let rest = table.get(start..)?;
    let nul = rest.iter().position(|&b| b == 0)?;
    Some(&rest[..nul])
}
