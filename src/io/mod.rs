pub mod config_io;
pub mod data_io;
pub mod lock;
pub mod repository;
