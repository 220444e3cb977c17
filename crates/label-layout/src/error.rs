use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Failed to decode PDF: {0}")]
    Decode(String),

    #[error("Label PDF must have exactly one page, found {found}")]
    PageCount { found: usize },

    #[error("Failed to encode output PDF: {0}")]
    Encode(String),

    #[error("Failed to render label page: {0}")]
    Render(String),

    #[error("Invalid layout configuration: {0}")]
    InvalidConfig(String),
}

impl LayoutError {
    /// True when the fault lies with the input or the configuration rather
    /// than with producing the output.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LayoutError::Decode(_) | LayoutError::PageCount { .. } | LayoutError::InvalidConfig(_)
        )
    }
}
