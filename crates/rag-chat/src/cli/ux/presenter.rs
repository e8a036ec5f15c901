use console::{Style, StyledObject};
use rag_chat_core::render::{RenderedMessage, SourceLink};

/// Represents the type of a chat text, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMessageType {
    /// The prompt for user input.
    Prompt,
    /// Label in front of a message.
    Speaker,
    /// Citation line under an assistant reply.
    Sources,
    /// Footer information, like status notices.
    Footer,
    /// An error message.
    Error,
}

/// Styles a string of text according to the specified `ChatMessageType`.
pub fn style_chat_text(text: &str, style: ChatMessageType) -> StyledObject<&str> {
    let style_obj = match style {
        ChatMessageType::Prompt => Style::new().blue().bold(),
        ChatMessageType::Speaker => Style::new().green().bold(),
        ChatMessageType::Sources => Style::new().cyan().dim(),
        ChatMessageType::Footer => Style::new().white().dim(),
        ChatMessageType::Error => Style::new().red().bold(),
    };
    style_obj.apply_to(text)
}

/// Joins source labels with a middle dot; `None` when there is nothing to cite.
pub fn format_sources(sources: &[SourceLink]) -> Option<String> {
    if sources.is_empty() {
        return None;
    }
    let labels: Vec<&str> = sources.iter().map(|s| s.label.as_str()).collect();
    Some(format!("Sources: {}", labels.join(" · ")))
}

/// Formats a rendered message for the terminal.
pub fn format_message(message: &RenderedMessage) -> String {
    let label = format!("{}:", message.role.as_str());
    let body = if message.failed {
        style_chat_text(&message.text, ChatMessageType::Error).to_string()
    } else if message.composing {
        style_chat_text(&message.text, ChatMessageType::Footer).to_string()
    } else {
        message.text.clone()
    };

    let mut text = format!(
        "{} {}",
        style_chat_text(&label, ChatMessageType::Speaker),
        body
    );
    if let Some(line) = format_sources(&message.sources) {
        text.push('\n');
        text.push_str(&style_chat_text(&line, ChatMessageType::Sources).to_string());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_chat_core::message::Role;

    fn link(label: &str) -> SourceLink {
        SourceLink {
            label: label.to_string(),
            title: format!("/docs/{label}"),
        }
    }

    #[test]
    fn test_message_styles() {
        let styled = style_chat_text("test", ChatMessageType::Error);
        assert_eq!(
            styled.force_styling(true).to_string(),
            "\u{1b}[31m\u{1b}[1mtest\u{1b}[0m"
        );
    }

    #[test]
    fn test_format_sources() {
        assert_eq!(format_sources(&[]), None);
        assert_eq!(
            format_sources(&[link("france.txt"), link("spain.md")]).unwrap(),
            "Sources: france.txt · spain.md"
        );
    }

    #[test]
    fn test_format_message_with_sources() {
        let message = RenderedMessage {
            role: Role::Assistant,
            text: "Paris is the capital.".to_string(),
            composing: false,
            failed: false,
            sources: vec![link("france.txt")],
        };

        let formatted = console::strip_ansi_codes(&format_message(&message)).to_string();
        assert_eq!(
            formatted,
            "assistant: Paris is the capital.\nSources: france.txt"
        );
    }

    #[test]
    fn test_format_message_failed() {
        let message = RenderedMessage {
            role: Role::Assistant,
            text: "Error: 500 boom".to_string(),
            composing: false,
            failed: true,
            sources: vec![],
        };

        let formatted = console::strip_ansi_codes(&format_message(&message)).to_string();
        assert_eq!(formatted, "assistant: Error: 500 boom");
    }

    #[test]
    fn test_format_message_user_label() {
        let message = RenderedMessage {
            role: Role::User,
            text: "Capital of France?".to_string(),
            composing: false,
            failed: false,
            sources: vec![],
        };

        let formatted = console::strip_ansi_codes(&format_message(&message)).to_string();
        assert_eq!(formatted, "user: Capital of France?");
    }
}
