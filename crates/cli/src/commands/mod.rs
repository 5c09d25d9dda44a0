pub mod doctor;
pub mod init;
pub mod replay;
pub mod status;
