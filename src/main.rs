use std::io::{self, Write};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use hondana::api::ApiClient;
use hondana::auth::{self, AuthGate, GateOutcome, LoginForm, RegisterForm};
use hondana::config::Config;
use hondana::directory::{BookDirectory, BorrowedList, LoadState};
use hondana::editor::BookForm;
use hondana::models::Book;
use hondana::session::SessionStore;

#[derive(Parser)]
#[command(name = "hondana", version, about = "本管理システムのクライアント")]
struct Cli {
    /// Backend base URL (falls back to HONDANA_API_URL, then the default).
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 全ての本を一覧表示
    List,
    /// タイトル・著者で検索
    Search { query: String },
    /// IDで1冊表示
    Show { id: i64 },
    /// 本を追加
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        pages: Option<String>,
        #[arg(long)]
        published_year: Option<String>,
    },
    /// 本を編集（指定した項目だけ上書き）
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        pages: Option<String>,
        #[arg(long)]
        published_year: Option<String>,
    },
    /// 本を削除
    Delete {
        id: i64,
        /// 確認をスキップ
        #[arg(long)]
        yes: bool,
    },
    /// 本を貸し出し（期限はサーバーが設定）
    Borrow { id: i64 },
    /// 本を返却
    Return { id: i64 },
    /// 貸出中の本一覧
    Borrowed,
    /// ログイン
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// 新規登録
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// ログアウト
    Logout,
    /// ログイン中のユーザーを表示
    Whoami,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    config.override_api_url(cli.api_url);
    let api = ApiClient::new(&config.api_url);

    let store = SessionStore::open(&config.session_path);
    store.restore();

    match run(cli.command, &api, &store) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, api: &ApiClient, store: &SessionStore) -> Result<(), String> {
    match command {
        Command::List => {
            guard(store)?;
            let mut directory = BookDirectory::new();
            directory.load(api);
            render_directory(&directory)
        }
        Command::Search { query } => {
            guard(store)?;
            let mut directory = BookDirectory::new();
            directory.search(api, &query);
            render_directory(&directory)
        }
        Command::Show { id } => {
            guard(store)?;
            let book = api
                .get_book(id)
                .map_err(|err| err.user_message("本の取得に失敗しました"))?;
            print_book(&book, Utc::now());
            Ok(())
        }
        Command::Add {
            title,
            author,
            isbn,
            description,
            pages,
            published_year,
        } => {
            guard(store)?;
            let mut form = BookForm::new();
            form.title = title;
            form.author = author;
            form.isbn = isbn.unwrap_or_default();
            form.description = description.unwrap_or_default();
            form.pages = pages.unwrap_or_default();
            form.published_year = published_year.unwrap_or_default();
            let book = form.submit(api)?;
            println!("保存しました");
            print_book(&book, Utc::now());
            Ok(())
        }
        Command::Edit {
            id,
            title,
            author,
            isbn,
            description,
            pages,
            published_year,
        } => {
            guard(store)?;
            let existing = api
                .get_book(id)
                .map_err(|err| err.user_message("本の取得に失敗しました"))?;
            let mut form = BookForm::for_book(&existing);
            overlay(&mut form.title, title);
            overlay(&mut form.author, author);
            overlay(&mut form.isbn, isbn);
            overlay(&mut form.description, description);
            overlay(&mut form.pages, pages);
            overlay(&mut form.published_year, published_year);
            let book = form.submit(api)?;
            println!("保存しました");
            print_book(&book, Utc::now());
            Ok(())
        }
        Command::Delete { id, yes } => {
            guard(store)?;
            if !yes && !confirm("この本を削除しますか？") {
                println!("中止しました");
                return Ok(());
            }
            let mut directory = BookDirectory::new();
            directory.load(api);
            if let LoadState::Failed(message) = &directory.state {
                return Err(message.clone());
            }
            directory.delete(api, id);
            if let Some(banner) = directory.banner {
                return Err(banner);
            }
            println!("削除しました");
            Ok(())
        }
        Command::Borrow { id } => {
            guard(store)?;
            let mut directory = BookDirectory::new();
            match directory.borrow(api, id) {
                Some(book) => {
                    println!("貸し出しました");
                    print_book(&book, Utc::now());
                    Ok(())
                }
                None => Err(directory.banner.unwrap_or_default()),
            }
        }
        Command::Return { id } => {
            guard(store)?;
            let mut directory = BookDirectory::new();
            match directory.give_back(api, id) {
                Some(book) => {
                    println!("返却しました");
                    print_book(&book, Utc::now());
                    Ok(())
                }
                None => Err(directory.banner.unwrap_or_default()),
            }
        }
        Command::Borrowed => {
            guard(store)?;
            let mut list = BorrowedList::new();
            list.load(api);
            render_borrowed(&list)
        }
        Command::Login { email, password } => {
            let form = LoginForm { email, password };
            let session = form.submit(api, store)?;
            println!("ログインしました: {} ({})", session.user.name, session.user.email);
            Ok(())
        }
        Command::Register {
            email,
            name,
            password,
            confirm_password,
        } => {
            let form = RegisterForm {
                email,
                name,
                password,
                confirm_password,
            };
            let session = form.submit(api, store)?;
            println!("登録成功！ようこそ、{}さん", session.user.name);
            Ok(())
        }
        Command::Logout => {
            auth::logout(store);
            println!("ログアウトしました");
            Ok(())
        }
        Command::Whoami => match store.current() {
            Some(session) => {
                println!("{} ({})", session.user.name, session.user.email);
                Ok(())
            }
            None => Err("未ログインです".to_string()),
        },
    }
}

/// Route guard for the book-catalog commands; login/register stay open.
fn guard(store: &SessionStore) -> Result<(), String> {
    match AuthGate::new(store).check() {
        GateOutcome::Render => Ok(()),
        GateOutcome::Wait => Err("認証状態を確認中...".to_string()),
        GateOutcome::RedirectToLogin { .. } => {
            Err("ログインが必要です。`hondana login` でログインしてください".to_string())
        }
    }
}

fn render_directory(directory: &BookDirectory) -> Result<(), String> {
    match &directory.state {
        LoadState::Failed(message) => Err(format!("{}（もう一度実行すると再試行します）", message)),
        LoadState::Loading => {
            println!("読み込み中...");
            Ok(())
        }
        LoadState::Ready => {
            if directory.books.is_empty() {
                println!("本が見つかりませんでした");
                return Ok(());
            }
            let now = Utc::now();
            for book in &directory.books {
                print_book(book, now);
            }
            Ok(())
        }
    }
}

fn render_borrowed(list: &BorrowedList) -> Result<(), String> {
    match &list.state {
        LoadState::Failed(message) => Err(format!("{}（もう一度実行すると再試行します）", message)),
        LoadState::Loading => {
            println!("貸出中の本を読み込み中...");
            Ok(())
        }
        LoadState::Ready => {
            println!("現在 {} 冊の本が貸し出されています", list.books.len());
            let now = Utc::now();
            for book in &list.books {
                print_book(book, now);
            }
            Ok(())
        }
    }
}

fn print_book(book: &Book, now: DateTime<Utc>) {
    println!("#{} {} / {}", book.id, book.title, book.author);
    let mut status = book.status_label(now);
    if book.is_overdue(now) {
        status.push_str(" ⚠️ 期限切れ");
    }
    println!("    ステータス: {}", status);
    if let Some(isbn) = &book.isbn {
        println!("    ISBN: {}", isbn);
    }
    if let Some(pages) = book.pages {
        println!("    ページ数: {}ページ", pages);
    }
    if let Some(year) = book.published_year {
        println!("    出版年: {}年", year);
    }
    if let Some(description) = &book.description {
        println!("    説明: {}", description);
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    let _ = io::stdout().flush();
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim(), "y" | "Y" | "yes")
}

fn overlay(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}
