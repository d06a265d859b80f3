use thiserror::Error;

/// Every way the coordinate pipeline can halt before rendering.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Neither the local file nor the remote fallback could be read.
    #[error("could not read {source_desc}: {reason}")]
    SourceUnavailable { source_desc: String, reason: String },

    /// The source was read but holds no usable rows.
    #[error("data file is empty or malformed: {0}")]
    EmptyOrMalformed(String),

    /// Fewer rows than a heatmap needs.
    #[error("insufficient data for visualization: {rows} row(s), at least 2 required")]
    InsufficientData { rows: usize },
}

impl LoadError {
    pub fn unavailable(source_desc: impl Into<String>, reason: impl ToString) -> Self {
        LoadError::SourceUnavailable {
            source_desc: source_desc.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        LoadError::EmptyOrMalformed(reason.into())
    }

    /// Banner text shown in place of the maps.
    pub fn user_message(&self) -> String {
        match self {
            LoadError::SourceUnavailable { .. } => format!("Error loading data: {self}"),
            LoadError::EmptyOrMalformed(_) => {
                format!("Data file is empty or malformed. Please check the source. ({self})")
            }
            LoadError::InsufficientData { .. } => {
                "Insufficient data for visualization. Please check the source file.".to_string()
            }
        }
    }
}
