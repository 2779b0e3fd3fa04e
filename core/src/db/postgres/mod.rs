pub mod connection;
pub mod text_file_repo;
