pub mod stage;
pub mod grow;
pub mod entry;
pub mod config;

pub use stage::*;
pub use grow::*;
pub use entry::*;
pub use config::*;
