use crate::database::error::RepositoryError;
use crate::database::manager::Catalog;
use crate::database::models::{Author, Book, BOOK_AUTHOR};
use crate::database::record::RecordId;
use crate::database::repository::Repository;
use crate::database::store::MemoryStore;

/// Book catalogue operations behind the `/books` routes.
#[derive(Clone)]
pub struct BookService {
    books: Repository<Book>,
    store: MemoryStore,
}

impl BookService {
    pub async fn new(catalog: &Catalog) -> Result<Self, RepositoryError> {
        Ok(Self {
            books: catalog.repository::<Book>().await?,
            store: catalog.store().clone(),
        })
    }

    pub async fn get_all_books(&self) -> Result<Vec<Book>, RepositoryError> {
        self.books.find_all().await
    }

    pub async fn get_book_by_id(&self, id: RecordId) -> Result<Book, RepositoryError> {
        self.books.get_by_id(id).await
    }

    /// Always inserts: any client-supplied id is discarded.
    pub async fn add_book(&self, mut book: Book) -> Result<Book, RepositoryError> {
        book.id = None;
        self.books.save(&book).await
    }

    /// Replaces an existing book. The path id wins over the body.
    pub async fn update_book_by_id(&self, id: RecordId, book: Book) -> Result<Book, RepositoryError> {
        self.books.replace(id, &book).await
    }

    pub async fn delete_book(&self, id: RecordId) -> Result<Book, RepositoryError> {
        self.books.delete_by_id(id).await
    }

    pub async fn delete_all(&self) -> Result<usize, RepositoryError> {
        self.books.delete_all().await
    }

    /// Stores a book together with its author.
    pub async fn add_book_with_author(&self, mut book: Book, mut author: Author) -> Result<(Book, Author), RepositoryError> {
        book.id = None;
        author.id = None;
        let (author, book) = BOOK_AUTHOR.save_cascade(&self.store, &author, &book).await?;
        Ok((book, author))
    }

    pub async fn author_of(&self, id: RecordId) -> Result<Option<Author>, RepositoryError> {
        let book = self.books.get_by_id(id).await?;
        BOOK_AUTHOR.load_parent(&self.store, &book).await
    }

    pub async fn books_by_author(&self, author: &str) -> Result<Vec<Book>, RepositoryError> {
        self.books.find_named("findByBookAuthor", vec![serde_json::json!(author)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> BookService {
        let catalog = Catalog::with_defaults().await.unwrap();
        BookService::new(&catalog).await.unwrap()
    }

    #[tokio::test]
    async fn add_ignores_client_id() {
        let service = service().await;
        let mut book = Book::new("The Art of Nothing", "ABC");
        book.id = Some(123);
        let saved = service.add_book(book).await.unwrap();
        assert_eq!(saved.id, Some(1));
    }

    #[tokio::test]
    async fn update_requires_existing_book() {
        let service = service().await;
        let err = service.update_book_by_id(7, Book::new("Ghost", "Nobody")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { id: 7, .. }));

        let saved = service.add_book(Book::new("Designing Your Life", "XYZ")).await.unwrap();
        let id = saved.id.unwrap();
        let updated = service.update_book_by_id(id, Book::new("Designing Your Life", "Burnett")).await.unwrap();
        assert_eq!(updated.book_author.as_deref(), Some("Burnett"));
        assert_eq!(service.get_all_books().await.unwrap().len(), 1);

        service.delete_book(id).await.unwrap();
        let err = service.update_book_by_id(id, Book::new("Designing Your Life", "Evans")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert!(service.get_all_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn author_round_trip() {
        let service = service().await;
        let (book, author) = service
            .add_book_with_author(Book::new("Dune", "Frank Herbert"), Author::new("Frank", "Herbert"))
            .await
            .unwrap();
        let loaded = service.author_of(book.id.unwrap()).await.unwrap();
        assert_eq!(loaded, Some(author));
        assert_eq!(service.books_by_author("Frank Herbert").await.unwrap(), vec![book]);
    }
}
