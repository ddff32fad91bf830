use std::path::Path;

/// Validation errors for uploaded images
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Only JPEG and PNG images are allowed. Invalid file extension: {extension}")]
    InvalidExtension { extension: String },

    #[error("Only JPEG and PNG images are allowed. Invalid content type: {content_type}")]
    InvalidContentType { content_type: String },

    #[error("Only JPEG and PNG images are allowed. Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

/// Content types expected for each accepted extension
fn expected_content_types(extension: &str) -> Option<&'static [&'static str]> {
    match extension {
        "jpg" | "jpeg" => Some(&["image/jpeg", "image/jpg"]),
        "png" => Some(&["image/png"]),
        _ => None,
    }
}

/// Lowercase the media type and drop any parameters (`; charset=...`)
fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Upload validator
///
/// Checks the declared filename and media type of an inbound file before any
/// byte of it is persisted, and the running size while it is streamed.
#[derive(Clone, Debug)]
pub struct MediaValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    /// Validator for the JPEG/PNG allow-list
    pub fn images(max_file_size: usize) -> Self {
        Self::new(
            max_file_size,
            vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            vec![
                "image/jpeg".to_string(),
                "image/jpg".to_string(),
                "image/png".to_string(),
            ],
        )
    }

    fn extension_of(filename: &str) -> Result<String, ValidationError> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))
    }

    /// Reject files above the maximum; usable on a running byte count
    pub fn validate_size_limit(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Validate the final file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        self.validate_size_limit(size)
    }

    /// Validate file extension (case-insensitive)
    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = Self::extension_of(filename)?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension { extension });
        }

        Ok(())
    }

    /// Validate declared content type (case-insensitive)
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = normalize_content_type(content_type);

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Validate that the content type corresponds to the file extension
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let extension = Self::extension_of(filename)?;
        let normalized = normalize_content_type(content_type);

        let expected = expected_content_types(&extension)
            .ok_or_else(|| ValidationError::InvalidExtension {
                extension: extension.clone(),
            })?;

        if !expected.iter().any(|ct| *ct == normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: format!(
                    "{} (does not match extension '{}'. Expected one of: {})",
                    content_type,
                    extension,
                    expected.join(", ")
                ),
            });
        }

        Ok(())
    }

    /// Validate the part headers: extension, content type, and their agreement.
    /// Runs before anything is written to transient storage.
    pub fn validate_headers(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        self.validate_extension(filename)?;
        self.validate_content_type(content_type)?;
        self.validate_extension_content_type_match(filename, content_type)?;
        Ok(())
    }
}
