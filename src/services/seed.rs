use rust_decimal::Decimal;
use tracing::info;

use crate::database::error::RepositoryError;
use crate::database::manager::Catalog;
use crate::database::models::{Book, Student};
use crate::database::repository::Repository;

fn maths_student(name: &str) -> Student {
    Student {
        id: None,
        student_name: name.to_string(),
        student_roll_no: Some(19),
        marks: Some(90),
        subject: Some("Maths".to_string()),
        grade: Some("A".to_string()),
        result: Some("Pass".to_string()),
    }
}

/// Saves the first student alone, then the whole class in one batch. The
/// first student already carries its id by then, so the batch updates it
/// instead of inserting a copy.
pub async fn seed_students(students: &Repository<Student>) -> Result<Vec<Student>, RepositoryError> {
    let first = students.save(&maths_student("Rahul")).await?;
    let class = vec![first, maths_student("Ram"), maths_student("Ratan"), maths_student("Rakesh")];
    let saved = students.save_all(&class).await?;
    info!("Seeded {} students", saved.len());
    Ok(saved)
}

pub async fn seed_books(books: &Repository<Book>) -> Result<Vec<Book>, RepositoryError> {
    let shelf = [
        ("The Art of Nothing", "ABC", "12.50"),
        ("Designing Your Life", "XYZ", "18.00"),
        ("Everything Will Be Fine", "PTR", "9.99"),
    ]
    .into_iter()
    .map(|(name, author, price)| {
        let mut book = Book::new(name, author);
        book.price = price.parse::<Decimal>().ok();
        book
    })
    .collect::<Vec<_>>();
    let saved = books.save_all(&shelf).await?;
    info!("Seeded {} books", saved.len());
    Ok(saved)
}

/// Fills empty collections with the demo data set.
pub async fn seed_demo(catalog: &Catalog) -> Result<(), RepositoryError> {
    let students = catalog.repository::<Student>().await?;
    if students.count().await? == 0 {
        seed_students(&students).await?;
    }
    let books = catalog.repository::<Book>().await?;
    if books.count().await? == 0 {
        seed_books(&books).await?;
    }
    Ok(())
}
