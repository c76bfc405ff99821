pub mod actions;
pub mod matcher;
pub mod project;
