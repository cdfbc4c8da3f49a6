//! # video-agent-skills
//!
//! Upload a video to Google's Gemini API, wait until the service has processed
//! it, then ask for a critique (`feedback`) or for the prompt that likely
//! produced it (`reverse`).

pub mod app;
pub mod cli;
pub mod client;
mod common;
pub mod config;
pub mod credentials;
pub mod files;
pub mod generation;
pub mod media;
pub mod models;
pub mod prompt;

pub use client::{Error as ClientError, Gemini, Model};
pub use files::{FileBuilder, FileHandle, FileState};
pub use generation::{ContentBuilder, GenerationResponse};
pub use models::{Content, Part, Role};
