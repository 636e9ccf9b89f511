use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One piece of a turn, serialized in the chat-completions content format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl Turn {
    pub fn system(text: &str) -> Self {
        Self {
            role: Role::System,
            content: vec![ContentPart::Text {
                text: text.to_string(),
            }],
        }
    }

    pub fn user(text: &str) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::Text {
                text: text.to_string(),
            }],
        }
    }

    pub fn with_image_url(mut self, url: String) -> Self {
        self.content.push(ContentPart::ImageUrl {
            image_url: ImageUrl { url },
        });
        self
    }

    /// Concatenated text parts of the turn.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn image_url(&self) -> Option<&str> {
        self.content.iter().find_map(|part| match part {
            ContentPart::ImageUrl { image_url } => Some(image_url.url.as_str()),
            ContentPart::Text { .. } => None,
        })
    }
}

/// The system turn followed by the user turn of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub system: Turn,
    pub user: Turn,
}

impl Conversation {
    pub fn new(system: Turn, user: Turn) -> Self {
        Self { system, user }
    }

    /// Turns in the order they are sent.
    pub fn messages(&self) -> [&Turn; 2] {
        [&self.system, &self.user]
    }
}
