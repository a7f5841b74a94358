use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::{Author, Book};
use crate::database::record::RecordId;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct BookWithAuthor {
    pub book: Book,
    pub author: Author,
}

/// GET /books
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Book>> {
    Ok(ApiResponse::success(state.books.get_all_books().await?))
}

/// GET /books/:id
pub async fn get(State(state): State<AppState>, id: Result<Path<RecordId>, PathRejection>) -> ApiResult<Book> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.books.get_book_by_id(id).await?))
}

/// POST /books - any id in the body is ignored
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Book>, JsonRejection>,
) -> ApiResult<Book> {
    let Json(book) = payload?;
    Ok(ApiResponse::created(state.books.add_book(book).await?))
}

/// PUT /books/:id - full replace of an existing book
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<Book>, JsonRejection>,
) -> ApiResult<Book> {
    let Path(id) = id?;
    let Json(book) = payload?;
    Ok(ApiResponse::success(state.books.update_book_by_id(id, book).await?))
}

/// DELETE /books/:id
pub async fn delete(State(state): State<AppState>, id: Result<Path<RecordId>, PathRejection>) -> ApiResult<()> {
    let Path(id) = id?;
    state.books.delete_book(id).await?;
    Ok(ApiResponse::no_content())
}

/// DELETE /books
pub async fn delete_all(State(state): State<AppState>) -> ApiResult<()> {
    state.books.delete_all().await?;
    Ok(ApiResponse::no_content())
}

/// GET /books/:id/author
pub async fn author(
    State(state): State<AppState>,
    id: Result<Path<RecordId>, PathRejection>,
) -> ApiResult<Author> {
    let Path(id) = id?;
    match state.books.author_of(id).await? {
        Some(author) => Ok(ApiResponse::success(author)),
        None => Err(ApiError::not_found(format!("book {} has no author", id))),
    }
}

/// POST /books/with-author - saves both in one transaction
pub async fn create_with_author(
    State(state): State<AppState>,
    payload: Result<Json<BookWithAuthor>, JsonRejection>,
) -> ApiResult<BookWithAuthor> {
    let Json(BookWithAuthor { book, author }) = payload?;
    let (book, author) = state.books.add_book_with_author(book, author).await?;
    Ok(ApiResponse::created(BookWithAuthor { book, author }))
}
