pub mod chat;
pub mod client;
pub mod commands;
pub mod state;
