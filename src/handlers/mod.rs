// handlers/mod.rs - HTTP handlers grouped by route prefix
//
//   public  → /, /health
//   books   → /books[/:id]
//   data    → /api/data/:schema[/:id]
//   find    → /api/find/:schema[/:finder]
pub mod books;
pub mod data;
pub mod find;
pub mod params;
pub mod public;
