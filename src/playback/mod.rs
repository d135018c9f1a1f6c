pub mod coordinator;
pub mod deadline;
pub mod port;

#[cfg(test)]
pub mod testing;


pub use coordinator::*;
pub use deadline::*;
pub use port::*;
