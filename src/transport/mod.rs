// MIT License
// Rust translation

pub mod command;
pub mod ws;
