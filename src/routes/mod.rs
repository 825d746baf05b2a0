mod api;
mod pages;

pub use api::{issue_handler, remaining};
pub use pages::index;
