//! Client-side core of the 本管理システム book catalog: data model, REST
//! gateway, session store, auth gate and the view logic behind the
//! directory, editor and borrow/return flows. All persistence and business
//! rules live in the external backend; this crate only renders and relays.

pub mod api;
pub mod auth;
pub mod config;
pub mod directory;
pub mod editor;
pub mod models;
pub mod session;
