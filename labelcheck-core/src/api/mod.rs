//! HTTP API handlers

pub mod forms;
pub mod health;
pub mod labels;
pub mod ul;

pub use forms::form_routes;
pub use health::health_routes;
pub use labels::label_routes;
pub use ul::ul_routes;
