//! Export destination port.

use std::io::Write;

/// A file created in the destination, ready to receive bytes.
pub struct CreatedFile {
    /// Name the file was actually created under.
    pub name: String,
    /// Writer for the file contents.
    pub writer: Box<dyn Write + Send>,
}

/// Port for a user-chosen output folder.
pub trait Destination: Send + Sync {
    /// Creates a new file named after `file_name`.
    ///
    /// Implementations never overwrite; they may pick a different name when
    /// `file_name` is taken and report it in [`CreatedFile::name`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    fn create(&self, file_name: &str) -> anyhow::Result<CreatedFile>;

    /// Human-readable description of the destination.
    fn describe(&self) -> String;
}
