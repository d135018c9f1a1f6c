pub mod config;
pub mod error;
pub mod media;
pub mod segment;


pub use config::*;
pub use error::*;
pub use media::*;
pub use segment::*;
