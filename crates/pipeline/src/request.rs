use serde::Deserialize;

const UNSAFE_FILE_NAME_CHARS: [char; 5] = ['/', '\\', '#', '?', '%'];

/// A request to render HTML and CSS into a stored PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RenderRequest {
    pub html: String,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Object file name. Defaults to `{id}.pdf`.
    #[serde(default, alias = "fileName")]
    pub file_name: Option<String>,
}

impl RenderRequest {
    pub fn new(html: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            css: css.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Validation messages; empty when the request is acceptable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.html.trim().is_empty() {
            errors.push("html must not be empty".to_owned());
        }
        if let Some(name) = &self.file_name {
            if name.trim().is_empty() {
                errors.push("file_name must not be empty".to_owned());
            } else if name.contains("..") || name.contains(UNSAFE_FILE_NAME_CHARS) {
                errors.push(
                    "file_name must not contain '..' or any of '/', '\\', '#', '?', '%'".to_owned(),
                );
            } else if name == "." {
                errors.push("file_name must not be '.'".to_owned());
            }
        }
        errors
    }
}
