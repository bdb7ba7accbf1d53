/// Errors produced while analyzing an MP4 buffer.
///
/// Only [`Error::TruncatedInput`] is fatal to a whole analysis. The other
/// kinds are contained by their callers: a malformed box becomes a marker
/// node in the tree, an inconsistent sample table empties one track, and
/// an unsupported descriptor downgrades to an "unknown codec" string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("input too short for a box header ({0} bytes)")]
    TruncatedInput(usize),

    #[error("malformed box: {0}")]
    MalformedBox(String),

    #[error("inconsistent sample table: {0}")]
    InconsistentSampleTable(String),

    #[error("unsupported descriptor: {0}")]
    UnsupportedDescriptor(String),
}

pub type Result<T> = std::result::Result<T, Error>;
