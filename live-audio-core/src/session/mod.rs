mod capture_path;
pub mod liveness;
mod mode_controller;
pub mod pipeline;
mod render_path;
mod state;
