pub mod archiver;
pub mod backup;
pub mod catalog;
pub mod job;
pub mod retention;
pub mod schedule;
