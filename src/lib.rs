pub mod config;
pub mod simulation;
pub mod remote;
pub mod scene;
pub mod graphics;
pub mod driver;

pub use simulation::*;
pub use config::*;
pub use driver::*;
