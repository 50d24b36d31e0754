//! Webshell app: connects the navigation policy core and the background
//! engine to a host's rendering surface and native UI.
pub mod bridge;
mod config;
mod coordinator;
pub mod logging;
mod surface;

pub use config::{load_config, parse_config, read_config, ConfigError, ShellConfig};
pub use coordinator::{Clock, Coordinator, UploadCompletion};
pub use surface::{HostShell, RenderingSurface};
