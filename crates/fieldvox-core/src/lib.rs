pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod types;
pub mod voice;

pub use config::FieldvoxConfig;
pub use device::{AudioDeviceLock, AudioLease};
pub use error::{FieldvoxError, Result};
pub use events::DialogueEvent;
pub use types::*;
pub use voice::{AudioRecorder, SpeechSynthesizer, Transcriber};
