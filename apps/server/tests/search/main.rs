#[path = "../support/mod.rs"]
mod support;

mod errors;
mod paging;
