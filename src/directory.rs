use chrono::{DateTime, Utc};

use crate::api::ApiClient;
use crate::models::Book;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready,
    /// Fetch failed; the message sits next to a manual retry. Nothing is
    /// retried automatically.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    Borrow,
    Return,
}

/// In-memory list for the current catalog view. Owns no state beyond what
/// is on screen; every refresh is a re-fetch.
pub struct BookDirectory {
    pub books: Vec<Book>,
    pub state: LoadState,
    pub banner: Option<String>,
}

impl BookDirectory {
    pub fn new() -> Self {
        BookDirectory {
            books: Vec::new(),
            state: LoadState::Loading,
            banner: None,
        }
    }

    pub fn load(&mut self, api: &ApiClient) {
        self.state = LoadState::Loading;
        self.banner = None;
        match api.list_books() {
            Ok(books) => {
                self.books = books;
                self.state = LoadState::Ready;
            }
            Err(err) => {
                self.state = LoadState::Failed(err.user_message("本の取得に失敗しました"));
            }
        }
    }

    /// Blank or whitespace-only queries fall back to the full list.
    pub fn search(&mut self, api: &ApiClient, query: &str) {
        let query = match normalized_query(query) {
            Some(query) => query,
            None => return self.load(api),
        };
        self.state = LoadState::Loading;
        self.banner = None;
        match api.search_books(query) {
            Ok(books) => {
                self.books = books;
                self.state = LoadState::Ready;
            }
            Err(err) => {
                self.state = LoadState::Failed(err.user_message("検索に失敗しました"));
            }
        }
    }

    /// The retry button re-issues the plain list fetch, even after a failed
    /// search.
    pub fn retry(&mut self, api: &ApiClient) {
        self.load(api);
    }

    /// Optimistic delete: the record leaves local state before the call and
    /// is not restored on failure; the banner is the only rollback.
    pub fn delete(&mut self, api: &ApiClient, id: i64) {
        remove_book(&mut self.books, id);
        if let Err(err) = api.delete_book(id) {
            self.banner = Some(err.user_message("削除に失敗しました"));
        }
    }

    pub fn borrow(&mut self, api: &ApiClient, id: i64) -> Option<Book> {
        match api.borrow_book(id) {
            Ok(updated) => {
                replace_book(&mut self.books, &updated);
                Some(updated)
            }
            Err(err) => {
                self.banner = Some(err.user_message("貸し出しに失敗しました"));
                None
            }
        }
    }

    pub fn give_back(&mut self, api: &ApiClient, id: i64) -> Option<Book> {
        match api.return_book(id) {
            Ok(updated) => {
                replace_book(&mut self.books, &updated);
                Some(updated)
            }
            Err(err) => {
                self.banner = Some(err.user_message("返却に失敗しました"));
                None
            }
        }
    }

    /// Which action a click on the status label performs, decided by the
    /// derived availability flag.
    pub fn loan_action(&self, id: i64, now: DateTime<Utc>) -> Option<LoanAction> {
        self.books.iter().find(|book| book.id == id).map(|book| {
            if book.actually_available(now) {
                LoanAction::Borrow
            } else {
                LoanAction::Return
            }
        })
    }

    pub fn toggle(&mut self, api: &ApiClient, id: i64, now: DateTime<Utc>) -> Option<Book> {
        match self.loan_action(id, now)? {
            LoanAction::Borrow => self.borrow(api, id),
            LoanAction::Return => self.give_back(api, id),
        }
    }

    pub fn available_books(&self, now: DateTime<Utc>) -> Vec<&Book> {
        self.books
            .iter()
            .filter(|book| book.actually_available(now))
            .collect()
    }
}

impl Default for BookDirectory {
    fn default() -> Self {
        BookDirectory::new()
    }
}

/// The borrowed-books page: currently loaned records plus overdue flagging.
pub struct BorrowedList {
    pub books: Vec<Book>,
    pub state: LoadState,
    pub banner: Option<String>,
}

impl BorrowedList {
    pub fn new() -> Self {
        BorrowedList {
            books: Vec::new(),
            state: LoadState::Loading,
            banner: None,
        }
    }

    pub fn load(&mut self, api: &ApiClient) {
        self.state = LoadState::Loading;
        self.banner = None;
        match api.borrowed_books() {
            Ok(books) => {
                self.books = books;
                self.state = LoadState::Ready;
            }
            Err(err) => {
                self.state =
                    LoadState::Failed(err.user_message("貸出中の本の取得に失敗しました"));
            }
        }
    }

    /// A returned book leaves the borrowed list.
    pub fn give_back(&mut self, api: &ApiClient, id: i64) -> Option<Book> {
        match api.return_book(id) {
            Ok(updated) => {
                remove_book(&mut self.books, id);
                Some(updated)
            }
            Err(err) => {
                self.banner = Some(err.user_message("返却に失敗しました"));
                None
            }
        }
    }

    pub fn overdue_books(&self, now: DateTime<Utc>) -> Vec<&Book> {
        self.books
            .iter()
            .filter(|book| book.is_overdue(now))
            .collect()
    }
}

impl Default for BorrowedList {
    fn default() -> Self {
        BorrowedList::new()
    }
}

fn normalized_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn remove_book(books: &mut Vec<Book>, id: i64) {
    books.retain(|book| book.id != id);
}

fn replace_book(books: &mut [Book], updated: &Book) {
    if let Some(slot) = books.iter_mut().find(|book| book.id == updated.id) {
        *slot = updated.clone();
    }
}
