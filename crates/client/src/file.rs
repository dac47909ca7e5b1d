//! Well-known file locations on the file server.

/// Which file of an id a call addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileServerFile {
    /// Every file of the id; only meaningful for deletion.
    All,
    /// Validation results of imported data, as JSON.
    Validation,
    /// Summary of imported data, as JSON.
    Summary,
    /// A file whose name the caller chooses.
    FreeFormat(String),
}

impl FileServerFile {
    /// Filename used on the file server, `None` for [`FileServerFile::All`].
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Validation => Some("validation.json"),
            Self::Summary => Some("summary.json"),
            Self::FreeFormat(filename) => Some(filename),
        }
    }

    /// Path segments addressing this file under `id`.
    pub(crate) fn segments<'a>(&'a self, id: &'a str) -> Vec<&'a str> {
        let mut segments = vec![id];
        segments.extend(self.filename());
        segments
    }
}
