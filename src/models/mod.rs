pub mod archive_result;
pub mod backup_entry;
pub mod config;
pub mod config_validator;
pub mod dry_run_mode;
pub mod error;
pub mod retention;
