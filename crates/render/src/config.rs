use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default renderer address (a local Gotenberg instance).
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Gotenberg's Chromium HTML conversion route.
pub const DEFAULT_RENDER_PATH: &str = "/forms/chromium/convert/html";

/// Page size and margins sent with every render request.
///
/// Values are passed through verbatim. Gotenberg reads bare numbers as
/// inches; the defaults are A4 with 0.4in margins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub paper_width: String,
    pub paper_height: String,
    pub margin_top: String,
    pub margin_bottom: String,
    pub margin_left: String,
    pub margin_right: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            paper_width: "8.27".to_owned(),
            paper_height: "11.7".to_owned(),
            margin_top: "0.4".to_owned(),
            margin_bottom: "0.4".to_owned(),
            margin_left: "0.4".to_owned(),
            margin_right: "0.4".to_owned(),
        }
    }
}

impl PageLayout {
    /// Multipart field names and values, in submission order.
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("paperWidth", self.paper_width.as_str()),
            ("paperHeight", self.paper_height.as_str()),
            ("marginTop", self.margin_top.as_str()),
            ("marginBottom", self.margin_bottom.as_str()),
            ("marginLeft", self.margin_left.as_str()),
            ("marginRight", self.margin_right.as_str()),
        ]
    }
}

/// Configuration for [`GotenbergClient`](crate::GotenbergClient).
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Renderer base URL, without a trailing slash.
    pub base_url: String,
    /// Path of the HTML conversion route.
    pub render_path: String,
    /// Per-request timeout.
    pub timeout: Duration,
    pub layout: PageLayout,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl RenderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            render_path: DEFAULT_RENDER_PATH.to_owned(),
            timeout: Duration::from_secs(30),
            layout: PageLayout::default(),
        }
    }

    #[must_use]
    pub fn with_render_path(mut self, render_path: impl Into<String>) -> Self {
        self.render_path = render_path.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Full URL of the conversion endpoint.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.render_path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_is_gotenberg_html_route() {
        assert_eq!(
            RenderConfig::default().endpoint(),
            "http://localhost:3000/forms/chromium/convert/html"
        );
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = RenderConfig::new("http://renderer:8080/").with_render_path("/render");
        assert_eq!(config.endpoint(), "http://renderer:8080/render");
    }

    #[test]
    fn layout_fields_cover_paper_and_four_margins() {
        let names: Vec<_> = PageLayout::default()
            .fields()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(
            names,
            [
                "paperWidth",
                "paperHeight",
                "marginTop",
                "marginBottom",
                "marginLeft",
                "marginRight"
            ]
        );
    }

    #[test]
    fn layout_deserializes_partially() {
        let layout: PageLayout = serde_json::from_str(r#"{"margin_top":"1"}"#).unwrap();
        assert_eq!(layout.margin_top, "1");
        assert_eq!(layout.paper_width, "8.27");
    }
}
