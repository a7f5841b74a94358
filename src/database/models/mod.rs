pub mod author;
pub mod book;
pub mod student;
pub mod user;

pub use author::Author;
pub use book::{Book, BOOK_AUTHOR};
pub use student::Student;
pub use user::User;
