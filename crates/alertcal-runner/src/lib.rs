pub mod config;
pub mod doctor;
pub mod reconcile;
pub mod runner;
pub mod scenario;
pub mod util;

pub use config::*;
pub use doctor::*;
pub use reconcile::*;
pub use runner::*;
pub use util::*;
