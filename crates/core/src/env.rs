//! Environment variable constants used throughout the application.
//!
//! Variables exported to hook processes live next to the runner in `hooks`.

/// Settings file path override (CLI arg default env)
pub const HOOKWORK_SETTINGS: &str = "HOOKWORK_SETTINGS";

/// Workspace directory override (CLI arg default env)
pub const HOOKWORK_WORKSPACE: &str = "HOOKWORK_WORKSPACE";

/// Config directory override (e.g. `~/.config/hookwork`)
pub const HOOKWORK_CONFIG_DIR: &str = "HOOKWORK_CONFIG_DIR";
