pub mod env;
pub mod home_file;
