//! AutoAnki: Flashcard Decks from Natural-Language Instructions
//!
//! A small staged workflow engine that threads a typed state through a
//! research stage and a card generation stage, each backed by an LLM, and
//! maps the final state to a success or error payload.

pub mod agent;
pub mod assembler;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod workflow;
