//! OpenAI-compatible REST facades over pretrained text-to-speech engines.
//!
//! The library is shared by two server binaries: `chatterbox-server` (English
//! primary engine plus a multilingual sibling) and `indextts-server`
//! (emotional engine with a degraded placeholder mode). Both expose
//! `POST /v1/audio/speech` and a voice-reference store for cloning prompts.

pub mod api;
pub mod audio;
pub mod config;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod voices;
