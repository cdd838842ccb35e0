pub mod handler;
pub mod page;
