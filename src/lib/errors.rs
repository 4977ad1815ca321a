use failure::Fail;

/// The Error enum containing all Errors that may occur when running wcrev
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Fail)]
pub enum Error {
    #[fail(display = "Invalid usage: {}", _0)]
    Syntax(String),
    #[fail(display = "File or directory '{}' does not exist", _0)]
    NotFound(String),
    #[fail(display = "Failed to open '{}'! Error: {}", path, err)]
    Open { path: String, err: String },
    #[fail(
        display = "Template expansion overflow! Replacing {} would grow the buffer to {} bytes, but only {} are available",
        marker, needed, capacity
    )]
    Overflow {
        marker: String,
        needed: usize,
        capacity: usize,
    },
    #[fail(
        display = "Can't splice {} bytes at offset {}: the template is only {} bytes long (capacity {})",
        len, start, buf_len, capacity
    )]
    Span {
        start: usize,
        len: usize,
        buf_len: usize,
        capacity: usize,
    },
    #[fail(display = "Failed to read/write the file! Error: {}", _0)]
    File(String),
    #[fail(display = "Failed to query the working copy status! Error: {}", _0)]
    Vcs(String),
    #[fail(display = "Failed to parse the status file! Error: {}", _0)]
    StatusFile(String),
    #[fail(display = "Working copy has local modifications!")]
    LocalMods,
    #[fail(display = "Working copy contains mixed revisions {}!", _0)]
    MixedRevisions(String),
    #[fail(display = "File '{}' already exists", _0)]
    OutputExists(String),
    #[fail(display = "'{}' is not a working copy", _0)]
    NotWorkingCopy(String),
}

impl Error {
    /// The process exit code wcrev reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Syntax(_) => 1,
            Error::NotFound(_) => 2,
            Error::Open { .. } => 3,
            Error::Overflow { .. } | Error::Span { .. } => 4,
            Error::File(_) | Error::StatusFile(_) => 5,
            Error::Vcs(_) => 6,
            Error::LocalMods => 7,
            Error::MixedRevisions(_) => 8,
            Error::OutputExists(_) => 9,
            Error::NotWorkingCopy(_) => 10,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::File(e.to_string())
    }
}

impl From<git2::Error> for Error {
    fn from(e: git2::Error) -> Self {
        Error::Vcs(e.message().to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::StatusFile(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::StatusFile(e.to_string())
    }
}
