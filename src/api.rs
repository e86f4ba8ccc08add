use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::models::{AuthResponse, Book, BookDraft};

/// Errors surfaced by the API gateway.
///
/// `Transport` covers requests that never completed usably (connection
/// failure or an undecodable success body). `Server` is a non-2xx response;
/// `detail` carries the backend's message when the body had one.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("サーバーとの通信に失敗しました")]
    Transport(#[from] reqwest::Error),
    #[error("{}", .detail.as_deref().unwrap_or("サーバーがリクエストを拒否しました"))]
    Server { status: u16, detail: Option<String> },
}

impl ApiError {
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Server { detail, .. } => detail.as_deref(),
            ApiError::Transport(_) => None,
        }
    }

    /// Message shown inline to the user: a server-supplied detail verbatim,
    /// the generic communication message for transport failures, otherwise
    /// the caller's context-specific fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Server { detail: Some(detail), .. } => detail.clone(),
            ApiError::Server { .. } => fallback.to_string(),
            ApiError::Transport(_) => "サーバーとの通信に失敗しました".to_string(),
        }
    }
}

/// Thin wrapper over the backend's REST surface: one method per endpoint,
/// no retries, no caching, no request deduplication.
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        ApiClient {
            // No request timeout: a hung request is left to the user.
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        self.execute(self.http.get(self.url("/api/books/")))
    }

    pub fn get_book(&self, id: i64) -> Result<Book, ApiError> {
        self.execute(self.http.get(self.url(&format!("/api/books/{}", id))))
    }

    pub fn create_book(&self, draft: &BookDraft) -> Result<Book, ApiError> {
        self.execute(self.http.post(self.url("/api/books/")).json(draft))
    }

    pub fn update_book(&self, id: i64, draft: &BookDraft) -> Result<Book, ApiError> {
        self.execute(
            self.http
                .put(self.url(&format!("/api/books/{}", id)))
                .json(draft),
        )
    }

    pub fn delete_book(&self, id: i64) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/books/{}", id)))
            .send()?;
        check_status(response).map(|_| ())
    }

    pub fn search_books(&self, query: &str) -> Result<Vec<Book>, ApiError> {
        self.execute(self.http.get(self.url(&search_path(query))))
    }

    pub fn borrow_book(&self, id: i64) -> Result<Book, ApiError> {
        self.execute(self.http.post(self.url(&format!("/api/books/{}/borrow", id))))
    }

    pub fn return_book(&self, id: i64) -> Result<Book, ApiError> {
        self.execute(self.http.post(self.url(&format!("/api/books/{}/return", id))))
    }

    pub fn borrowed_books(&self) -> Result<Vec<Book>, ApiError> {
        self.execute(self.http.get(self.url("/api/books/borrowed")))
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.execute(
            self.http
                .post(self.url("/api/auth/login"))
                .json(&json!({ "email": email, "password": password })),
        )
    }

    pub fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.execute(
            self.http
                .post(self.url("/api/auth/register"))
                .json(&json!({ "email": email, "name": name, "password": password })),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send()?;
        let response = check_status(response)?;
        Ok(response.json()?)
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let detail = extract_detail(&body);
    log::warn!("server rejected request: status={} detail={:?}", status, detail);
    Err(ApiError::Server {
        status: status.as_u16(),
        detail,
    })
}

fn search_path(query: &str) -> String {
    format!("/api/books/search?q={}", urlencoding::encode(query))
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(|entry| entry.as_str())
        .map(str::trim)
        .filter(|detail| !detail.is_empty())
        .map(str::to_string)
}
