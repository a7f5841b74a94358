pub mod data;
pub mod demo;
pub mod find;
pub mod serve;
