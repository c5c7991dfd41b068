#![allow(dead_code)]

use std::io::Write;

pub const DGSH_NOTE_NAME: &[u8] = b"DSpinellis/dgsh\0";

/// Builds minimal ELF relocatable images: a null section, the caller's
/// sections in order, then `.shstrtab`, followed by the section header table.
pub struct ElfImage {
    is_64: bool,
    big_endian: bool,
    entry_padding: usize,
    sections: Vec<Section>,
}

struct Section {
    name: String,
    sh_type: u32,
    content: Vec<u8>,
    /// `sh_size` when it differs from the stored content length.
    size: Option<u64>,
}

const SHT_PROGBITS: u32 = 1;
const SHT_STRTAB: u32 = 3;
const SHT_NOTE: u32 = 7;
const SHT_NOBITS: u32 = 8;

impl ElfImage {
    pub fn new64() -> Self {
        Self {
            is_64: true,
            big_endian: false,
            entry_padding: 0,
            sections: Vec::new(),
        }
    }

    pub fn new32() -> Self {
        Self {
            is_64: false,
            ..Self::new64()
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    /// Declares section header entries `padding` bytes wider than the layout.
    pub fn entry_padding(mut self, padding: usize) -> Self {
        self.entry_padding = padding;
        self
    }

    pub fn section(self, name: &str, content: &[u8]) -> Self {
        self.push(name, SHT_PROGBITS, content, None)
    }

    pub fn note_section(self, name: &str, content: &[u8]) -> Self {
        self.push(name, SHT_NOTE, content, None)
    }

    /// A section that occupies `size` bytes in memory and none in the file.
    pub fn nobits_section(self, name: &str, size: u64) -> Self {
        self.push(name, SHT_NOBITS, b"", Some(size))
    }

    fn push(mut self, name: &str, sh_type: u32, content: &[u8], size: Option<u64>) -> Self {
        self.sections.push(Section {
            name: name.to_string(),
            sh_type,
            content: content.to_vec(),
            size,
        });
        self
    }

    pub fn dgsh(self) -> Self {
        let note = self.note(DGSH_NOTE_NAME, b"", 0);
        self.note_section(".note.ident", &note)
    }

    /// Encodes one note record with this image's byte order.
    pub fn note(&self, name: &[u8], desc: &[u8], n_type: u32) -> Vec<u8> {
        let mut out = Vec::new();
        self.put_u32(&mut out, name.len() as u32);
        self.put_u32(&mut out, desc.len() as u32);
        self.put_u32(&mut out, n_type);
        out.extend_from_slice(name);
        pad(&mut out, 4);
        out.extend_from_slice(desc);
        pad(&mut out, 4);
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let (ehsize, layout_size) = if self.is_64 { (64, 64) } else { (52, 40) };
        let shentsize = layout_size + self.entry_padding;

        let mut shstrtab = vec![0u8];
        let mut names = Vec::new();
        for section in &self.sections {
            names.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(section.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab\0");

        let mut out = vec![0u8; ehsize];
        let mut placed = Vec::new();
        for section in &self.sections {
            pad(&mut out, 4);
            let size = section.size.unwrap_or(section.content.len() as u64);
            placed.push((out.len() as u64, size));
            out.extend_from_slice(&section.content);
        }
        let shstrtab_offset = out.len() as u64;
        out.extend_from_slice(&shstrtab);
        pad(&mut out, 8);
        let shoff = out.len() as u64;

        // null section
        out.extend(std::iter::repeat(0).take(shentsize));
        for (i, section) in self.sections.iter().enumerate() {
            let (offset, size) = placed[i];
            self.put_shdr(&mut out, names[i], section.sh_type, offset, size);
        }
        self.put_shdr(
            &mut out,
            shstrtab_name,
            SHT_STRTAB,
            shstrtab_offset,
            shstrtab.len() as u64,
        );

        let shnum = self.sections.len() as u16 + 2;
        let shstrndx = shnum - 1;
        let mut header = Vec::new();
        header.extend_from_slice(b"\x7fELF");
        header.push(if self.is_64 { 2 } else { 1 });
        header.push(if self.big_endian { 2 } else { 1 });
        header.push(1);
        header.resize(16, 0);
        self.put_u16(&mut header, 1); // ET_REL
        self.put_u16(&mut header, 62); // EM_X86_64
        self.put_u32(&mut header, 1);
        self.put_word(&mut header, 0); // e_entry
        self.put_word(&mut header, 0); // e_phoff
        self.put_word(&mut header, shoff);
        self.put_u32(&mut header, 0);
        self.put_u16(&mut header, ehsize as u16);
        self.put_u16(&mut header, 0);
        self.put_u16(&mut header, 0);
        self.put_u16(&mut header, shentsize as u16);
        self.put_u16(&mut header, shnum);
        self.put_u16(&mut header, shstrndx);
        assert_eq!(header.len(), ehsize);
        out[..ehsize].copy_from_slice(&header);

        out
    }

    fn put_shdr(&self, out: &mut Vec<u8>, name: u32, sh_type: u32, offset: u64, size: u64) {
        self.put_u32(out, name);
        self.put_u32(out, sh_type);
        self.put_word(out, 0); // sh_flags
        self.put_word(out, 0); // sh_addr
        self.put_word(out, offset);
        self.put_word(out, size);
        self.put_u32(out, 0); // sh_link
        self.put_u32(out, 0); // sh_info
        self.put_word(out, 1); // sh_addralign
        self.put_word(out, 0); // sh_entsize
        out.extend(std::iter::repeat(0).take(self.entry_padding));
    }

    fn put_u16(&self, out: &mut Vec<u8>, v: u16) {
        if self.big_endian {
            out.extend_from_slice(&v.to_be_bytes());
        } else {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn put_u32(&self, out: &mut Vec<u8>, v: u32) {
        if self.big_endian {
            out.extend_from_slice(&v.to_be_bytes());
        } else {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn put_word(&self, out: &mut Vec<u8>, v: u64) {
        match (self.is_64, self.big_endian) {
            (true, false) => out.extend_from_slice(&v.to_le_bytes()),
            (true, true) => out.extend_from_slice(&v.to_be_bytes()),
            (false, _) => self.put_u32(out, v as u32),
        }
    }
}

fn pad(out: &mut Vec<u8>, align: usize) {
    out.resize(out.len().next_multiple_of(align), 0);
}

/// Offset of the dgsh note owner name inside `image`.
pub fn dgsh_name_offset(image: &[u8]) -> usize {
    image
        .windows(DGSH_NOTE_NAME.len())
        .position(|w| w == DGSH_NOTE_NAME)
        .expect("image carries no dgsh note")
}

pub fn write_temp(content: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
    file.write_all(content).expect("temp file should be written");
    file.flush().expect("temp file should be flushed");
    file
}
