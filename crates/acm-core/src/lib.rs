pub mod config;
pub mod logging;

pub mod archive;
pub mod backup;
pub mod checksum;
pub mod download;
pub mod host;
pub mod install;
pub mod paths;
pub mod release;
pub mod sources;
pub mod state;
pub mod switch;
pub mod validate;
