//! Role-based redirects and return-URL bookkeeping

use parking_lot::RwLock;

use super::session::Session;
use crate::domain::sellers::OnboardingStatus;
use crate::domain::users::{Role, User};

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";
pub const SELLER_DASHBOARD: &str = "/seller/dashboard";
pub const SELLER_ONBOARDING: &str = "/seller/onboarding";
pub const HOME: &str = "/";

/// Pages reachable without signing in. A 401 seen on one of these never
/// forces a login.
pub const PUBLIC_PATHS: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/products",
    "/deals",
    "/shops",
    "/stores",
    "/categories",
    "/about",
    "/contact",
];

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Exact matches, plus detail pages below a listed section such as
/// `/products/<id>`. The root only matches itself.
pub fn is_public_path(path: &str) -> bool {
    let path = strip_query(path);
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    PUBLIC_PATHS.iter().any(|public| {
        path == *public
            || (*public != "/"
                && path
                    .strip_prefix(public)
                    .is_some_and(|rest| rest.starts_with('/')))
    })
}

/// Landing page after login.
pub fn dashboard_for(user: &User) -> &'static str {
    match user.role {
        Role::Admin => ADMIN_DASHBOARD,
        Role::Seller => {
            let approved = user
                .onboarding_status
                .clone()
                .map(OnboardingStatus::from)
                == Some(OnboardingStatus::Approved);
            if approved {
                SELLER_DASHBOARD
            } else {
                SELLER_ONBOARDING
            }
        }
        Role::Customer => HOME,
    }
}

/// Whether a role may be sent to a path.
fn allowed_for(role: Role, path: &str) -> bool {
    let path = strip_query(path);
    if path.starts_with("/admin") {
        return role == Role::Admin;
    }
    if path.starts_with("/seller") {
        return role == Role::Seller;
    }
    true
}

/// A same-origin path. `//host` and `/\host` are read by browsers as
/// another origin.
fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\")
}

/// Where to go once the user has logged in: the remembered page if the role
/// may see it, otherwise the role's dashboard. The remembered page is
/// consumed either way.
pub fn post_login_destination(session: &Session, user: &User) -> String {
    match session.take_return_url() {
        Some(url) if is_local_path(&url) && url != LOGIN_PATH && allowed_for(user.role, &url) => url,
        _ => dashboard_for(user).to_string(),
    }
}

/// Where the client currently is and how it moves.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
}

/// Send the user to login, remembering the current page so they can come
/// back to it.
pub fn redirect_to_login(session: &Session, navigator: &dyn Navigator) {
    let current = navigator.current_path();
    if strip_query(&current) != LOGIN_PATH {
        session.set_return_url(&current);
    }
    navigator.navigate(LOGIN_PATH);
}

/// Navigator with an in-memory history.
#[derive(Debug)]
pub struct MemoryNavigator {
    history: RwLock<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(start: &str) -> Self {
        Self {
            history: RwLock::new(vec![start.to_string()]),
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.history.read().clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(HOME)
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.history
            .read()
            .last()
            .cloned()
            .unwrap_or_else(|| HOME.to_string())
    }

    fn navigate(&self, path: &str) {
        self.history.write().push(path.to_string());
    }
}
