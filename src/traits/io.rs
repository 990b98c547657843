//! RON I/O
use std::fs;
use thiserror::Error;

/// An error while reading or writing RON
#[derive(Debug, Error)]
pub enum RonError {
    /// Reading or writing a file failed
    #[error("Unable to access {filename}: {source}")]
    File {
        /// The file
        filename: String,
        /// The underlying error
        source: std::io::Error,
    },
    /// Serialisation failed
    #[error("Unable to write RON: {0}")]
    Serialize(#[from] ron::Error),
    /// The input is not valid RON for the type being read
    #[error("Unable to parse RON: {0}")]
    Deserialize(#[from] ron::error::SpannedError),
    /// The input is valid RON but does not describe a valid object
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub trait ConvertToSerializable: Sized {
    //! Convert to/from a serializable form
    type SerializableType: serde::Serialize + for<'a> serde::Deserialize<'a>;
    /// Convert to the serializable form
    fn to_serializable(&self) -> Self::SerializableType;
    /// Convert from the serializable form
    fn from_serializable(s: Self::SerializableType) -> Result<Self, RonError>;
}

pub trait RONExport {
    //! Export as RON

    /// Generate the RON string
    fn to_ron_string(&self) -> Result<String, RonError>;

    /// Export as RON
    fn export_as_ron(&self, filename: &str) -> Result<(), RonError> {
        let ron_s = self.to_ron_string()?;
        fs::write(filename, ron_s).map_err(|source| RonError::File {
            filename: filename.to_string(),
            source,
        })
    }
}

pub trait RONImport: Sized {
    //! Import from RON

    /// Create from a RON string
    fn from_ron_string(s: &str) -> Result<Self, RonError>;

    /// Import from RON
    fn import_from_ron(filename: &str) -> Result<Self, RonError> {
        let content = fs::read_to_string(filename).map_err(|source| RonError::File {
            filename: filename.to_string(),
            source,
        })?;
        Self::from_ron_string(&content)
    }
}
