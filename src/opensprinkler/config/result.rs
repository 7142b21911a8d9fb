use core::fmt;
use std::{io, sync::Arc};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Error {
    Io(Arc<io::Error>),

    #[non_exhaustive]
    SerializationError(Arc<bson::ser::Error>),

    #[non_exhaustive]
    DeserializationError(Arc<bson::de::Error>),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Io(ref err) => write!(f, "IO Error: {}", err),
            Self::SerializationError(ref err) => write!(f, "Serialization Error: {}", err),
            Self::DeserializationError(ref err) => write!(f, "Deserialization Error: {}", err),
        }
    }
}

impl From<bson::ser::Error> for Error {
    fn from(err: bson::ser::Error) -> Error {
        Error::SerializationError(Arc::new(err))
    }
}

impl From<bson::de::Error> for Error {
    fn from(err: bson::de::Error) -> Error {
        Error::DeserializationError(Arc::new(err))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(Arc::new(err))
    }
}
