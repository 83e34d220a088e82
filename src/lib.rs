//! NivelVer admin - capture and publish audio comprehension items
//!
//! This crate provides the audio capture-and-upload pipeline behind the
//! NivelVer admin tool: microphone recording, local preview, upload to
//! object storage and persistence of the finished item.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Audio items, recording and form state machines, upload rules
//! - **Application**: Recorder, preview manager, uploader, form controller and port traits
//! - **Infrastructure**: Adapter implementations (cpal, rodio, Firebase Storage, Firestore, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and operator input

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
