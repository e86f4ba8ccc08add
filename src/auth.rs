use crate::api::ApiClient;
use crate::session::{Session, SessionStatus, SessionStore};

/// What a guarded view should do given the current session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Session restore is still pending: show a placeholder, no redirect.
    Wait,
    /// Render the protected subtree.
    Render,
    /// Send the user to the login route. `replace` means the redirect
    /// replaces the history entry so back-navigation cannot loop.
    RedirectToLogin { replace: bool },
}

/// Route-level guard: reads the session store, never mutates it.
pub struct AuthGate<'a> {
    store: &'a SessionStore,
}

impl<'a> AuthGate<'a> {
    pub fn new(store: &'a SessionStore) -> Self {
        AuthGate { store }
    }

    pub fn check(&self) -> GateOutcome {
        match self.store.status() {
            SessionStatus::Loading => GateOutcome::Wait,
            SessionStatus::Authenticated => GateOutcome::Render,
            SessionStatus::Unauthenticated => GateOutcome::RedirectToLogin { replace: true },
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() || self.password.trim().is_empty() {
            return Err("メールアドレスとパスワードを入力してください".to_string());
        }
        Ok(())
    }

    /// Validates locally, exchanges credentials for a token+user pair and
    /// hands them to the session store. Validation failures never reach the
    /// network.
    pub fn submit(&self, api: &ApiClient, store: &SessionStore) -> Result<Session, String> {
        self.validate()?;
        let response = api
            .login(self.email.trim(), &self.password)
            .map_err(|err| err.user_message("ログインに失敗しました"))?;
        let session = Session {
            access_token: response.access_token,
            user: response.user,
        };
        store.login(session.clone());
        log::info!("logged in as {}", session.user.email);
        Ok(session)
    }
}

#[derive(Debug, Default, Clone)]
pub struct RegisterForm {
    pub email: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty()
            || self.name.trim().is_empty()
            || self.password.trim().is_empty()
        {
            return Err("すべての項目を入力してください".to_string());
        }
        if self.password != self.confirm_password {
            return Err("パスワードが一致しません".to_string());
        }
        if self.password.chars().count() < 6 {
            return Err("パスワードは6文字以上で入力してください".to_string());
        }
        Ok(())
    }

    pub fn submit(&self, api: &ApiClient, store: &SessionStore) -> Result<Session, String> {
        self.validate()?;
        let response = api
            .register(self.email.trim(), self.name.trim(), &self.password)
            .map_err(|err| err.user_message("ユーザー登録に失敗しました"))?;
        let session = Session {
            access_token: response.access_token,
            user: response.user,
        };
        store.login(session.clone());
        log::info!("registered {}", session.user.email);
        Ok(session)
    }
}

pub fn logout(store: &SessionStore) {
    store.logout();
    log::info!("logged out");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn store_at(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::open(&dir.path().join("session.json"))
    }

    fn active_store(dir: &tempfile::TempDir) -> SessionStore {
        let store = store_at(dir);
        store.restore();
        store.login(Session {
            access_token: "t".to_string(),
            user: User {
                id: None,
                email: "admin@example.com".to_string(),
                name: "Admin".to_string(),
            },
        });
        store
    }

    #[test]
    fn gate_waits_while_loading() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir);
        assert_eq!(AuthGate::new(&store).check(), GateOutcome::Wait);
    }

    #[test]
    fn gate_redirects_unauthenticated_with_replace() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir);
        store.restore();
        assert_eq!(
            AuthGate::new(&store).check(),
            GateOutcome::RedirectToLogin { replace: true }
        );
    }

    #[test]
    fn gate_renders_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = active_store(&dir);
        assert_eq!(AuthGate::new(&store).check(), GateOutcome::Render);
    }

    #[test]
    fn login_requires_both_fields() {
        let form = LoginForm {
            email: "  ".to_string(),
            password: "password".to_string(),
        };
        assert_eq!(
            form.validate().unwrap_err(),
            "メールアドレスとパスワードを入力してください"
        );
    }

    #[test]
    fn login_validation_failure_issues_no_request() {
        // An unroutable gateway: any network attempt would surface the
        // transport message instead of the validation one.
        let api = ApiClient::new("http://127.0.0.1:1");
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir);
        store.restore();

        let form = LoginForm::default();
        let err = form.submit(&api, &store).unwrap_err();
        assert_eq!(err, "メールアドレスとパスワードを入力してください");
        assert_eq!(store.current(), None);
    }

    #[test]
    fn register_blocks_on_password_mismatch() {
        let form = RegisterForm {
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret2".to_string(),
        };
        assert_eq!(form.validate().unwrap_err(), "パスワードが一致しません");

        let api = ApiClient::new("http://127.0.0.1:1");
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir);
        store.restore();
        let err = form.submit(&api, &store).unwrap_err();
        assert_eq!(err, "パスワードが一致しません");
        assert_eq!(store.current(), None);
    }

    #[test]
    fn register_enforces_minimum_password_length() {
        let form = RegisterForm {
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            password: "short".to_string(),
            confirm_password: "short".to_string(),
        };
        assert_eq!(
            form.validate().unwrap_err(),
            "パスワードは6文字以上で入力してください"
        );
    }

    #[test]
    fn register_requires_every_field() {
        let form = RegisterForm {
            email: "a@example.com".to_string(),
            name: String::new(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        };
        assert_eq!(form.validate().unwrap_err(), "すべての項目を入力してください");
    }

    #[test]
    fn logout_clears_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = active_store(&dir);
        logout(&store);
        assert_eq!(store.current(), None);
    }
}
