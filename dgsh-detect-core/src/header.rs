pub mod elf;

pub trait Header: std::fmt::Debug + Send + Sync {
    /// Returns the file offset of the section header table.
    fn section_header_offset(&self) -> u64;

    /// Returns the size of one section header table entry.
    fn section_header_entry_size(&self) -> u64;

    /// Returns the number of section header table entries.
    fn section_count(&self) -> u64;

    /// Returns the index of the section that holds section names.
    fn string_table_index(&self) -> u64;

    /// Returns a short human-readable name, e.g. "ELF32" or "ELF64".
    fn format_name(&self) -> &'static str;
}
