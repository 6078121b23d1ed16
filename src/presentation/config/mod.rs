mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AuthSettings, ImageSettings, ServerSettings, Settings, SilenceSettings, StorageSettings,
    TranscriptionSettings,
};
