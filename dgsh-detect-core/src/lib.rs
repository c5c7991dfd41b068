pub mod detector;
pub mod format;
mod header;
pub mod note;
pub mod script;
pub mod view;

pub use detector::*;
pub use format::*;
pub use note::{scan_binary, DGSH_NOTE_NAME, NOTE_SECTION_NAME};
pub use script::scan_script;
pub use view::*;
