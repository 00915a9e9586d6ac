//! Handler modules

pub mod connection;
pub mod room;
pub mod round;

pub use connection::*;
pub use room::*;
pub use round::*;
