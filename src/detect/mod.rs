pub mod host;
pub mod setup;
pub mod tools;
pub mod user;

pub use host::{HostInstallInfo, detect_host_install};
pub use setup::{InstallPaths, detect_existing_setup};
pub use tools::{AgentStatus, PackageManager, agent_status};
pub use user::{detect_actual_user, resolve_config_dir, resolve_project_dir};
