pub mod market;
pub mod setup;
pub mod simulate;
pub mod ui;
pub mod watch;
