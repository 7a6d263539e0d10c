pub mod actions;
pub mod init;
pub mod run;
