pub mod book_service;
pub mod seed;

pub use book_service::BookService;
