//! Catalog management service: libraries, books and copies

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        copy::{BookCopy, CopyDetails, CreateCopy},
        library::{CreateLibrary, Library, LibraryDetails, LibraryQuery, UpdateLibrary},
        pagination::{Page, PaginatedResponse},
    },
    repository::{filters, Repository},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // =========================================================================
    // LIBRARIES
    // =========================================================================

    /// List libraries with filters
    pub async fn search_libraries(&self, query: &LibraryQuery) -> AppResult<PaginatedResponse<Library>> {
        let page = Page::new(query.page, query.per_page)?;
        let params = filters::params([("name", &query.name), ("slug", &query.slug)]);
        let (libraries, total) = self.repository.libraries.search(&params, page).await?;
        Ok(PaginatedResponse::new(libraries, total, page))
    }

    /// Library with inventory counters
    pub async fn get_library(&self, slug: &str) -> AppResult<LibraryDetails> {
        self.repository.libraries.get_details(slug).await
    }

    pub async fn create_library(&self, data: CreateLibrary) -> AppResult<Library> {
        data.validate()?;
        let library = self.repository.libraries.create(&data).await?;
        tracing::info!(library_id = library.id, slug = %library.slug, "Library created");
        Ok(library)
    }

    pub async fn update_library(&self, slug: &str, data: UpdateLibrary) -> AppResult<Library> {
        data.validate()?;
        self.repository.libraries.update(slug, &data).await
    }

    pub async fn delete_library(&self, slug: &str) -> AppResult<()> {
        self.repository.libraries.delete(slug).await?;
        tracing::info!(slug, "Library deleted");
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    /// Search the catalog with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<PaginatedResponse<Book>> {
        let page = Page::new(query.page, query.per_page)?;
        let params = filters::params([
            ("title", &query.title),
            ("author", &query.author),
            ("isbn", &query.isbn),
        ]);
        let (books, total) = self.repository.books.search(&params, page).await?;
        Ok(PaginatedResponse::new(books, total, page))
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create_book(&self, mut data: CreateBook) -> AppResult<Book> {
        data.isbn = data.isbn.map(|isbn| normalize_isbn(&isbn));
        data.validate()?;
        let book = self.repository.books.create(&data).await?;
        tracing::info!(book_id = book.id, title = %book.title, "Book created");
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, mut data: UpdateBook) -> AppResult<Book> {
        data.isbn = data.isbn.map(|isbn| normalize_isbn(&isbn));
        data.validate()?;
        self.repository.books.update(id, &data).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    // =========================================================================
    // COPIES
    // =========================================================================

    /// Copies of a book across libraries
    pub async fn list_copies(&self, book_id: i32) -> AppResult<Vec<CopyDetails>> {
        self.repository.books.get_by_id(book_id).await?;
        self.repository.copies.list_for_book(book_id).await
    }

    pub async fn get_copy(&self, copy_id: i32) -> AppResult<CopyDetails> {
        self.repository.copies.get_details(copy_id).await
    }

    /// Put a new copy of a book on a library's shelf
    pub async fn create_copy(&self, data: CreateCopy) -> AppResult<BookCopy> {
        let library = self.repository.libraries.get_by_slug(&data.library_slug).await?;
        if !self.repository.books.exists(data.book_id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", data.book_id)));
        }

        let copy = self.repository.copies.create(data.book_id, library.id).await?;
        tracing::info!(copy_id = copy.id, book_id = copy.book_id, library = %library.slug, "Copy added");
        Ok(copy)
    }

    pub async fn delete_copy(&self, copy_id: i32) -> AppResult<()> {
        self.repository.copies.delete(copy_id).await?;
        tracing::info!(copy_id, "Copy removed");
        Ok(())
    }
}

/// Strip separators from an ISBN (`978-2-07-040850-4` -> `9782070408504`)
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
