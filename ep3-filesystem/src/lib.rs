pub mod bitmap;
pub mod dirent;
pub mod error;
pub mod fat;
pub mod filesystem;
pub mod image;
pub mod layout;
pub mod path;
pub mod shell;

pub use dirent::ChildRecord;
pub use error::{Error, Result};
pub use filesystem::Filesystem;
pub use layout::Layout;
pub use shell::{dispatch, parse, Command};
