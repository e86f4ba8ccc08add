use chrono::{Datelike, Utc};

use crate::api::ApiClient;
use crate::models::{Book, BookDraft};

/// The create/edit form, fields kept as entered. Whether submit creates or
/// updates depends on whether an existing record seeded the form.
#[derive(Debug, Default, Clone)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: String,
    pub pages: String,
    pub published_year: String,
    editing: Option<i64>,
}

impl BookForm {
    pub fn new() -> Self {
        BookForm::default()
    }

    pub fn for_book(book: &Book) -> Self {
        BookForm {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone().unwrap_or_default(),
            description: book.description.clone().unwrap_or_default(),
            pages: book.pages.map(|value| value.to_string()).unwrap_or_default(),
            published_year: book
                .published_year
                .map(|value| value.to_string())
                .unwrap_or_default(),
            editing: Some(book.id),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    /// Local validation; nothing here touches the network. Blank optional
    /// fields become `None` and are omitted from the request body.
    pub fn validate(&self, current_year: i64) -> Result<BookDraft, String> {
        let title = self.title.trim();
        let author = self.author.trim();
        if title.is_empty() || author.is_empty() {
            return Err("タイトルと著者は必須です".to_string());
        }

        let pages = match parse_optional_int(&self.pages) {
            Ok(value) => value,
            Err(_) => return Err("ページ数は1以上の整数で入力してください".to_string()),
        };
        if let Some(pages) = pages {
            if pages < 1 {
                return Err("ページ数は1以上の整数で入力してください".to_string());
            }
        }

        let published_year = match parse_optional_int(&self.published_year) {
            Ok(value) => value,
            Err(_) => {
                return Err(year_range_message(current_year));
            }
        };
        if let Some(year) = published_year {
            if year < 1000 || year > current_year {
                return Err(year_range_message(current_year));
            }
        }

        Ok(BookDraft {
            title: title.to_string(),
            author: author.to_string(),
            isbn: non_blank(&self.isbn),
            description: non_blank(&self.description),
            pages,
            published_year,
        })
    }

    pub fn submit(&self, api: &ApiClient) -> Result<Book, String> {
        let draft = self.validate(i64::from(Utc::now().year()))?;
        let result = match self.editing {
            Some(id) => api.update_book(id, &draft),
            None => api.create_book(&draft),
        };
        result.map_err(|err| err.user_message("保存に失敗しました"))
    }
}

fn parse_optional_int(raw: &str) -> Result<Option<i64>, ()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<i64>().map(Some).map_err(|_| ())
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn year_range_message(current_year: i64) -> String {
    format!("出版年は1000年から{}年の間で入力してください", current_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> BookForm {
        BookForm {
            title: "吾輩は猫である".to_string(),
            author: "夏目漱石".to_string(),
            ..BookForm::default()
        }
    }

    #[test]
    fn empty_title_or_author_is_rejected() {
        let mut form = filled();
        form.title = "   ".to_string();
        assert_eq!(form.validate(2024).unwrap_err(), "タイトルと著者は必須です");

        let mut form = filled();
        form.author = String::new();
        assert_eq!(form.validate(2024).unwrap_err(), "タイトルと著者は必須です");
    }

    #[test]
    fn required_fields_are_trimmed() {
        let mut form = filled();
        form.title = "  A  ".to_string();
        form.author = " B ".to_string();
        let draft = form.validate(2024).unwrap();
        assert_eq!(draft.title, "A");
        assert_eq!(draft.author, "B");
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let mut form = filled();
        form.isbn = "   ".to_string();
        form.pages = String::new();
        form.published_year = String::new();
        let draft = form.validate(2024).unwrap();
        assert_eq!(draft.isbn, None);
        assert_eq!(draft.description, None);
        assert_eq!(draft.pages, None);
        assert_eq!(draft.published_year, None);
    }

    #[test]
    fn pages_must_be_a_positive_integer() {
        let mut form = filled();
        form.pages = "0".to_string();
        assert!(form.validate(2024).is_err());

        form.pages = "abc".to_string();
        assert!(form.validate(2024).is_err());

        form.pages = "300".to_string();
        assert_eq!(form.validate(2024).unwrap().pages, Some(300));
    }

    #[test]
    fn published_year_bounds_include_current_year() {
        let mut form = filled();
        form.published_year = "999".to_string();
        assert!(form.validate(2024).is_err());

        form.published_year = "1000".to_string();
        assert_eq!(form.validate(2024).unwrap().published_year, Some(1000));

        form.published_year = "2024".to_string();
        assert_eq!(form.validate(2024).unwrap().published_year, Some(2024));

        form.published_year = "2025".to_string();
        assert_eq!(
            form.validate(2024).unwrap_err(),
            "出版年は1000年から2024年の間で入力してください"
        );
    }

    #[test]
    fn for_book_prefills_and_marks_edit() {
        let book = crate::models::Book {
            id: 7,
            title: "A".to_string(),
            author: "B".to_string(),
            isbn: Some("978-4-00-310101-8".to_string()),
            description: None,
            pages: Some(220),
            published_year: Some(1906),
            is_available: true,
            borrowed_until: None,
            created_at: None,
            updated_at: None,
        };
        let form = BookForm::for_book(&book);
        assert!(form.is_edit());
        assert_eq!(form.isbn, "978-4-00-310101-8");
        assert_eq!(form.pages, "220");
        assert_eq!(form.description, "");

        assert!(!BookForm::new().is_edit());
    }

    #[test]
    fn validation_failure_submits_nothing() {
        let api = ApiClient::new("http://127.0.0.1:1");
        let mut form = filled();
        form.title = String::new();
        // A network attempt would yield the transport message instead.
        assert_eq!(form.submit(&api).unwrap_err(), "タイトルと著者は必須です");
    }
}
