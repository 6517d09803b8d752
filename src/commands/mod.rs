pub mod extract;
pub mod progress;
pub mod rows;
pub mod status;
pub mod validate;
