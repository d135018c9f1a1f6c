pub mod console;
pub mod debounce;
pub mod events;
pub mod gpio;
pub mod manager;
pub mod router;


pub use console::*;
pub use debounce::*;
pub use events::*;
pub use gpio::*;
pub use manager::*;
pub use router::*;
