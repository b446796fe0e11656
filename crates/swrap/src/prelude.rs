pub use crate::error::{Error, ErrorKind};

pub type Result<T> = std::result::Result<T, Error>;
