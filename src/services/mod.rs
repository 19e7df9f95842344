pub mod generation_client;
pub mod generation_service;
pub mod html_renderer;

pub use generation_client::GenerationClient;
pub use generation_service::{GeminiBackend, GenerationBackend};
pub use html_renderer::render_worksheet_html;
