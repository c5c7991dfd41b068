use crate::format::Format;
use crate::note::scan_binary;
use crate::script::scan_script;
use crate::view::FileView;
use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome of checking one program that could be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub path: PathBuf,
    pub format: Format,
    pub compatible: bool,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "is_dgsh_program({})={}",
            self.path.display(),
            u8::from(self.compatible)
        )
    }
}

/// Classifies `data` and runs the matching scanner.
pub fn scan(data: &[u8]) -> bool {
    scan_as(Format::classify(data), data)
}

fn scan_as(format: Format, data: &[u8]) -> bool {
    match format {
        Format::Script => scan_script(data),
        Format::Binary => scan_binary(data),
    }
}

/// Loads and inspects the program at `path`.
///
/// `Err` means the file could not be inspected at all (missing, unreadable,
/// empty); malformed contents are an `Ok` verdict of "not compatible".
pub fn check<P: AsRef<Path>>(path: P) -> Result<Verdict> {
    let path = path.as_ref();
    let view = FileView::load(path)?;
    log::trace!("{}: mapped {} bytes", path.display(), view.len());
    let format = Format::classify(view.as_bytes());
    let compatible = scan_as(format, view.as_bytes());

    Ok(Verdict {
        path: path.to_path_buf(),
        format,
        compatible,
    })
}

/// Returns true if the program at `path` declares dgsh compatibility.
///
/// Never fails: every load error and every malformed file is a `false`.
pub fn is_compatible<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    match check(path) {
        Ok(verdict) => {
            log::debug!("{verdict} ({})", verdict.format);
            verdict.compatible
        }
        Err(err) => {
            log::debug!("is_dgsh_program({})=0 ({err:#})", path.display());
            false
        }
    }
}
