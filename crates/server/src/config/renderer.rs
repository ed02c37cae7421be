use std::time::Duration;

use serde::Deserialize;
use vellum_render::{DEFAULT_BASE_URL, DEFAULT_RENDER_PATH, PageLayout, RenderConfig};

/// Remote renderer (Gotenberg) configuration.
///
/// ```toml
/// [renderer]
/// base_url = "http://gotenberg:3000"
/// timeout_seconds = 60
///
/// [renderer.layout]
/// paper_width = "8.5"
/// paper_height = "11"
/// ```
#[derive(Debug, Deserialize)]
pub struct RendererConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_render_path")]
    pub render_path: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub layout: PageLayout,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            render_path: default_render_path(),
            timeout_seconds: default_timeout(),
            layout: PageLayout::default(),
        }
    }
}

impl RendererConfig {
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig::new(&self.base_url)
            .with_render_path(&self.render_path)
            .with_timeout(Duration::from_secs(self.timeout_seconds))
            .with_layout(self.layout.clone())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_render_path() -> String {
    DEFAULT_RENDER_PATH.to_owned()
}

fn default_timeout() -> u64 {
    30
}
