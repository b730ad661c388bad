//! Terminal UI: model (state), view (drawing), controller (event loop)

pub mod controller;
pub mod model;
pub mod view;

pub use controller::run;
pub use model::{App, ScreenDisplay};
