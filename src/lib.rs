// Library exports for chartdash

pub mod canvas;
pub mod dashboard;
pub mod data;
pub mod loader;
pub mod parser;
pub mod render;
pub mod resolver;
pub mod sankey;
pub mod schema;
pub mod sunburst;

use serde::Deserialize;

/// Output dimensions for rendered figures.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}
