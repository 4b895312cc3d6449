pub mod config;
pub mod exam;
pub mod prefs;
pub mod timer;
pub mod watch;
