pub mod commands;
pub mod display;
