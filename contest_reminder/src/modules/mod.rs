pub mod bot;
pub mod context;
