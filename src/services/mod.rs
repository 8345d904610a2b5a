pub mod ai;
pub mod booking;
pub mod chat;
pub mod dialogue;
pub mod parser;
