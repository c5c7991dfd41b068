use crate::header::elf::ElfHeader;
use crate::header::Header;
use crate::view::{cstr_at, ByteView, Endian};

/// Section that carries identification notes.
pub const NOTE_SECTION_NAME: &[u8] = b".note.ident";

/// Note owner written by dgsh-aware programs, terminator included.
pub const DGSH_NOTE_NAME: &[u8] = b"DSpinellis/dgsh\0";

/// `n_namesz`, `n_descsz` and `n_type`, 4-byte words in both ELF classes.
const NOTE_HEADER_SIZE: u64 = 12;
const NOTE_ALIGN: u64 = 4;

/// Returns true if the ELF image in `data` carries the dgsh identification
/// note. Anything malformed before the note is found yields false.
pub fn scan_binary(data: &[u8]) -> bool {
    find_dgsh_note(data).unwrap_or(false)
}

fn find_dgsh_note(data: &[u8]) -> Option<bool> {
    let header = ElfHeader::parse(data)?;
    let view = ByteView::new(data, header.endian);
    log::trace!(
        "{} section table at {:#x}: {} entries of {} bytes",
        header.format_name(),
        header.section_header_offset(),
        header.section_count(),
        header.section_header_entry_size()
    );
    let strtab = header
        .section(&view, header.string_table_index())?
        .content(&view)?;

    for index in 0..header.section_count() {
        let section = header.section(&view, index)?;
        match cstr_at(strtab, u64::from(section.sh_name)) {
            Some(name) if name == NOTE_SECTION_NAME => {}
            Some(_) => continue,
            None => {
                log::trace!("section {index}: name offset {} unresolved", section.sh_name);
                continue;
            }
        }

        let Some(content) = section.content(&view) else {
            log::trace!("section {index}: note contents outside the file");
            return None;
        };
        if NoteNames::new(content, header.endian).any(|name| name == DGSH_NOTE_NAME) {
            return Some(true);
        }
    }

    Some(false)
}

/// Walks the owner names of the records in a note section.
///
/// A record counts once its name fits inside the section; a descriptor that
/// runs past the end only stops the walk after that record.
#[derive(Debug, Clone)]
pub struct NoteNames<'a> {
    view: ByteView<'a>,
    offset: u64,
}

impl<'a> NoteNames<'a> {
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            view: ByteView::new(data, endian),
            offset: 0,
        }
    }
}

impl<'a> Iterator for NoteNames<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offset;
        let n_namesz = self.view.read_u32_at(offset)?;
        let n_descsz = self.view.read_u32_at(offset.checked_add(4)?)?;
        let name_start = offset.checked_add(NOTE_HEADER_SIZE)?;
        let name = self.view.bytes(name_start, u64::from(n_namesz))?;

        self.offset = name_start
            .checked_add(u64::from(n_namesz))
            .and_then(align)
            .and_then(|desc| desc.checked_add(u64::from(n_descsz)))
            .and_then(align)
            .unwrap_or(u64::MAX);
        Some(name)
    }
}

fn align(offset: u64) -> Option<u64> {
    Some(offset.checked_add(NOTE_ALIGN - 1)? & !(NOTE_ALIGN - 1))
}
