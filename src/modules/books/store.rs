//! In-memory book store.
//!
//! An ordered sequence of books where a book's external identifier is its
//! current zero-based position. Insertions and deletions shift identifiers;
//! callers bounds-check against `len()` at request time.

use std::sync::{Arc, RwLock};

use anyhow::Context;

use super::models::Book;

/// Shared handle passed to handlers via axum state.
pub type SharedStore = Arc<RwLock<BookStore>>;

/// Ordered, positionally indexed collection of books.
#[derive(Debug, Default)]
pub struct BookStore {
    books: Vec<Book>,
}

impl BookStore {
    /// Create a store pre-populated with the fixed seed records.
    pub fn seeded() -> Self {
        Self {
            books: vec![
                Book {
                    title: "El señor de los anillos".to_string(),
                    author: "J.R.R. Tolkien".to_string(),
                    publication_year: 1954,
                },
                Book {
                    title: "1984".to_string(),
                    author: "George Orwell".to_string(),
                    publication_year: 1949,
                },
                Book {
                    title: "Cien años de soledad".to_string(),
                    author: "Gabriel García Márquez".to_string(),
                    publication_year: 1967,
                },
                Book {
                    title: "To Kill a Mockingbird".to_string(),
                    author: "Harper Lee".to_string(),
                    publication_year: 1960,
                },
                Book {
                    title: "Harry Potter y la piedra filosofal".to_string(),
                    author: "J.K. Rowling".to_string(),
                    publication_year: 1997,
                },
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Slice `[skip, skip + limit)` in original order. Out-of-range skip
    /// yields an empty list, never an error.
    pub fn list(&self, skip: usize, limit: usize) -> Vec<Book> {
        self.books.iter().skip(skip).take(limit).cloned().collect()
    }

    pub fn get(&self, index: usize) -> Option<Book> {
        self.books.get(index).cloned()
    }

    /// Append a book; its identifier is the store length before the append.
    pub fn append(&mut self, book: Book) -> usize {
        self.books.push(book);
        self.books.len() - 1
    }

    /// Replace the book at `index` in place and return the new content.
    /// Callers bounds-check first; a failure here is unexpected and is
    /// surfaced to the client as an internal error.
    pub fn replace(&mut self, index: usize, book: Book) -> anyhow::Result<Book> {
        let slot = self
            .books
            .get_mut(index)
            .with_context(|| format!("replace index {index} out of bounds"))?;
        *slot = book.clone();
        Ok(book)
    }

    /// Remove and return the book at `index`; later books shift down by one
    /// identifier.
    pub fn remove(&mut self, index: usize) -> Option<Book> {
        if index < self.books.len() {
            Some(self.books.remove(index))
        } else {
            None
        }
    }
}
