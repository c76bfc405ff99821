pub mod message;
pub mod result;
pub mod task;
pub mod view;
