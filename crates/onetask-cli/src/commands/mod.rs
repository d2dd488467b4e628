pub mod daily;
pub mod data;
pub mod settings;
pub mod task;
