use thiserror::Error;

/// Error kinds raised while mounting, parsing, or operating on an image.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("no space left on device")]
    NoSpace,

    #[error("directory is full")]
    DirFull,

    #[error("filesystem is not mounted")]
    NotMounted,

    #[error("filesystem is already mounted")]
    AlreadyMounted,

    #[error("no such file: {0}")]
    NoSuchFile(String),

    #[error("no such directory: {0}")]
    NoSuchDir(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("is a directory: {0}")]
    IsDirectory(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("failed to open image: {0}")]
    ImageOpenError(String),

    #[error("failed to open host file: {0}")]
    HostOpenError(String),

    #[error("corrupt image: {0}")]
    CorruptImage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
