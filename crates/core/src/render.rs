//! Pure view models for messages. Hosts decide how to draw them.
use crate::api::Source;
use crate::message::{Message, MessageState, Role};

/// Label used when a source carries no origin.
pub const FALLBACK_SOURCE_LABEL: &str = "source";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    /// Basename of the origin path.
    pub label: String,
    /// Full origin, kept for hover text or lookup.
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub role: Role,
    pub text: String,
    pub composing: bool,
    pub failed: bool,
    pub sources: Vec<SourceLink>,
}

/// Last `/`-separated segment of a source origin.
pub fn source_label(source: &Source) -> String {
    match source.source.as_deref() {
        Some(origin) if !origin.is_empty() => origin
            .rsplit('/')
            .next()
            .unwrap_or(origin)
            .to_string(),
        _ => FALLBACK_SOURCE_LABEL.to_string(),
    }
}

pub fn render_sources(sources: &[Source]) -> Vec<SourceLink> {
    sources
        .iter()
        .map(|s| SourceLink {
            label: source_label(s),
            title: s.source.clone().unwrap_or_default(),
        })
        .collect()
}

pub fn render_message(message: &Message) -> RenderedMessage {
    let sources = match message.role {
        Role::Assistant => render_sources(&message.sources),
        Role::User => Vec::new(),
    };
    RenderedMessage {
        role: message.role,
        text: message.text.clone(),
        composing: message.state == MessageState::Composing,
        failed: message.state == MessageState::Failed,
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_label_takes_basename() {
        assert_eq!(source_label(&Source::new("/docs/france.txt")), "france.txt");
        assert_eq!(source_label(&Source::new("france.txt")), "france.txt");
        assert_eq!(source_label(&Source::new("N/A")), "A");
        assert_eq!(source_label(&Source::default()), "source");
        assert_eq!(source_label(&Source::new("")), "source");
    }

    #[test]
    fn test_trailing_slash_gives_empty_label() {
        assert_eq!(source_label(&Source::new("/docs/")), "");
    }

    #[test]
    fn test_render_sources_empty() {
        assert!(render_sources(&[]).is_empty());
    }

    #[test]
    fn test_render_message_assistant_with_sources() {
        let mut message = Message::assistant("Paris is the capital.");
        message.sources = vec![Source::new("/docs/france.txt")];

        let rendered = render_message(&message);
        assert_eq!(rendered.text, "Paris is the capital.");
        assert!(!rendered.composing);
        assert_eq!(
            rendered.sources,
            vec![SourceLink {
                label: "france.txt".to_string(),
                title: "/docs/france.txt".to_string(),
            }]
        );
    }

    #[test]
    fn test_render_message_user_never_shows_sources() {
        let mut message = Message::user("hi");
        message.sources = vec![Source::new("/docs/france.txt")];
        assert!(render_message(&message).sources.is_empty());
    }
}
