use std::collections::HashMap;
use tracing::debug;

use crate::client::session::Session;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Upper bound on redirects followed for a single navigation
const MAX_REDIRECTS: usize = 5;

/// Screens the client can show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Register,
    Login,
    Dashboard,
    ApplyJob { job_id: i64 },
    EditApplication { id: i64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    /// Only for visitors without a token (login, register)
    pub guest: bool,
}

#[derive(Clone, Copy)]
enum Target {
    Redirect(&'static str),
    View {
        name: &'static str,
        meta: RouteMeta,
        build: fn(&HashMap<&'static str, &str>) -> Option<View>,
    },
}

#[derive(Clone, Copy)]
struct RouteDef {
    pattern: &'static str,
    target: Target,
}

const GUEST: RouteMeta = RouteMeta {
    requires_auth: false,
    guest: true,
};
const AUTH: RouteMeta = RouteMeta {
    requires_auth: true,
    guest: false,
};

fn param(params: &HashMap<&'static str, &str>, name: &str) -> Option<i64> {
    params.get(name)?.parse().ok()
}

const ROUTES: &[RouteDef] = &[
    RouteDef {
        pattern: "/",
        target: Target::Redirect(DASHBOARD_PATH),
    },
    RouteDef {
        pattern: "/register",
        target: Target::View {
            name: "Register",
            meta: GUEST,
            build: |_| Some(View::Register),
        },
    },
    RouteDef {
        pattern: "/login",
        target: Target::View {
            name: "Login",
            meta: GUEST,
            build: |_| Some(View::Login),
        },
    },
    RouteDef {
        pattern: "/dashboard",
        target: Target::View {
            name: "Dashboard",
            meta: AUTH,
            build: |_| Some(View::Dashboard),
        },
    },
    RouteDef {
        pattern: "/apply/:jobId",
        target: Target::View {
            name: "ApplyJob",
            meta: AUTH,
            build: |params| {
                Some(View::ApplyJob {
                    job_id: param(params, "jobId")?,
                })
            },
        },
    },
    RouteDef {
        pattern: "/edit-application/:id",
        target: Target::View {
            name: "EditApplication",
            meta: AUTH,
            build: |params| {
                Some(View::EditApplication {
                    id: param(params, "id")?,
                })
            },
        },
    },
];

/// A path matched against the route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Redirect(&'static str),
    View {
        name: &'static str,
        meta: RouteMeta,
        view: View,
    },
}

/// Outcome of a guarded navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Show this view; `path` is where navigation ended up
    Show { path: String, view: View },
    NotFound { path: String },
}

/// Match `pattern` segments against `path`, collecting `:name` parameters
fn match_pattern<'a>(
    pattern: &'static str,
    path: &'a str,
) -> Option<HashMap<&'static str, &'a str>> {
    let pattern_segments: Vec<&'static str> =
        pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (&expected, &actual) in pattern_segments.iter().zip(path_segments.iter()) {
        match expected.strip_prefix(':') {
            Some(name) => {
                params.insert(name, actual);
            }
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}

/// Declarative path table with an auth/guest guard in front of every view
#[derive(Debug, Default, Clone, Copy)]
pub struct Router;

impl Router {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, path: &str) -> Option<Resolved> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        ROUTES.iter().find_map(|route| {
            let params = match_pattern(route.pattern, path)?;
            match route.target {
                Target::Redirect(to) => Some(Resolved::Redirect(to)),
                Target::View { name, meta, build } => Some(Resolved::View {
                    name,
                    meta,
                    view: build(&params)?,
                }),
            }
        })
    }

    /// Where the guard sends a visitor heading for a route with `meta`.
    ///
    /// Only local token presence is consulted; the token is not validated.
    pub fn guard(meta: RouteMeta, session: &Session) -> Option<&'static str> {
        if meta.requires_auth && !session.is_authenticated() {
            Some(LOGIN_PATH)
        } else if meta.guest && session.is_authenticated() {
            Some(DASHBOARD_PATH)
        } else {
            None
        }
    }

    /// Resolve `path` and follow static and guard redirects to a view
    pub fn navigate(&self, path: &str, session: &Session) -> Navigation {
        let mut current = path.to_string();
        for _ in 0..=MAX_REDIRECTS {
            let next = match self.resolve(&current) {
                None => return Navigation::NotFound { path: current },
                Some(Resolved::Redirect(to)) => to,
                Some(Resolved::View { name, meta, view }) => match Self::guard(meta, session) {
                    Some(to) => {
                        debug!("Guard redirected {} ({}) to {}", current, name, to);
                        to
                    }
                    None => return Navigation::Show { path: current, view },
                },
            };
            current = next.to_string();
        }
        Navigation::NotFound { path: current }
    }
}
