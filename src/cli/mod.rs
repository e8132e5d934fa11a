pub mod args;
pub mod explore;
pub mod render;
