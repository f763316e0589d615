pub mod chat;
pub mod copy;
pub mod library;
pub mod tags;
pub mod variables;
