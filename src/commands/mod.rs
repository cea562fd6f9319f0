pub mod completions;
pub mod doctor;
pub mod init;
pub mod render;
pub mod run;
