pub mod light_panel;
pub mod text;

pub use light_panel::LightPanel;
pub use text::TextRenderer;
