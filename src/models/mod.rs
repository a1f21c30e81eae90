pub mod chat;
pub mod content;
