pub mod game;
pub mod restart;
pub mod slicing;
pub mod spawner;

pub use restart::RestartButton;
pub use slicing::{slicing_system, TimeForSlicing};
pub use spawner::Spawner;
