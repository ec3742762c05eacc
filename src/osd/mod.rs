pub mod app;
pub mod overlay;
pub mod style;

pub use app::{install, run};
pub use overlay::Overlay;
