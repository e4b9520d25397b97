//! CLI command handlers, one file per command.

mod backup;
mod check_update;
mod install;
mod status;
mod uninstall;
mod use_config;
mod validate;

pub use backup::run_backup;
pub use check_update::run_check_update;
pub use install::run_install;
pub use status::run_status;
pub use uninstall::run_uninstall;
pub use use_config::run_use;
pub use validate::run_validate;
