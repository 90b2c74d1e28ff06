pub mod env_file;
pub mod first_run;
pub mod settings;

pub use env_file::{EnvFile, EnvFileError};
pub use first_run::{ConfigOption, SetupError, SetupOutcome, SetupWizard, configure_global_identity};
pub use settings::{ConfigError, ENV_PREFIX, Settings};
