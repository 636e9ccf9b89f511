pub mod conversation;

pub use conversation::{ContentPart, Conversation, ImageUrl, Role, Turn};
