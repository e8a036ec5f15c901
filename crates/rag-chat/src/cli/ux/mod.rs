mod presenter;
mod progress;

pub use presenter::{ChatMessageType, format_message, format_sources, style_chat_text};
pub use progress::GenerationSpinner;

use console::style;

/// Prints a formatted error message to stderr.
pub fn present_error(error: anyhow::Error) {
    let error_text = style("ERROR:").red().bold();
    eprintln!("\n{error_text} {error:#}");
}
