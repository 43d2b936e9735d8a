pub mod credentials;
pub mod loader;
pub mod schema;
pub mod settings;
pub mod yaml_env;

pub use credentials::{
    CredentialStore,
    FileCredentialStore,
    MemoryCredentialStore,
};
pub use settings::{
    Settings,
    SettingsLoader,
};
