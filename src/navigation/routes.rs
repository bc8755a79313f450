//! Route table with per-record authentication metadata.

use serde::Serialize;

const CATCH_ALL: &str = "*";
const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone)]
pub struct RouteRecord {
    pub path: String,
    pub name: Option<String>,
    pub requires_auth: bool,
    pub redirect: Option<String>,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            requires_auth: false,
            redirect: None,
            children: Vec::new(),
        }
    }

    /// Matches any path not claimed by an earlier record
    pub fn catch_all() -> Self {
        Self::new(CATCH_ALL)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect = Some(path.into());
        self
    }

    pub fn with_children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }
}

/// Metadata of one record on the matched chain (parent first)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMeta {
    pub path: String,
    pub name: Option<String>,
    pub requires_auth: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoute {
    /// Path without query or hash
    pub path: String,
    /// Path including query and hash, as requested
    pub full_path: String,
    pub name: Option<String>,
    pub matched: Vec<RouteMeta>,
}

impl ResolvedRoute {
    /// Initial location before any navigation has happened
    pub fn start() -> Self {
        Self {
            path: "/".to_string(),
            full_path: "/".to_string(),
            name: None,
            matched: Vec::new(),
        }
    }

    /// True when any record on the matched chain requires auth
    pub fn requires_auth(&self) -> bool {
        self.matched.iter().any(|m| m.requires_auth)
    }
}

struct FlatRoute {
    segments: Vec<String>,
    catch_all: bool,
    redirect: Option<String>,
    name: Option<String>,
    chain: Vec<RouteMeta>,
}

impl FlatRoute {
    fn matches(&self, segments: &[&str]) -> bool {
        if self.catch_all {
            return true;
        }
        self.segments.len() == segments.len()
            && self
                .segments
                .iter()
                .zip(segments)
                .all(|(pattern, actual)| pattern.starts_with(':') || pattern == actual)
    }
}

pub struct RouteTable {
    routes: Vec<FlatRoute>,
}

impl RouteTable {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        let mut routes = Vec::new();
        flatten(&records, "", &[], &mut routes);
        Self { routes }
    }

    /// Routes of the course admin front end
    pub fn admin() -> Self {
        Self::new(vec![
            RouteRecord::new("/").redirect_to("/app/dashboard"),
            RouteRecord::new("/login").named("Login").requires_auth(false),
            RouteRecord::new("/register").named("Register").requires_auth(false),
            RouteRecord::new("/dashboard").redirect_to("/app/dashboard"),
            RouteRecord::new("/app").requires_auth(true).with_children(vec![
                RouteRecord::new("dashboard").named("Dashboard"),
                RouteRecord::new("profile").named("Profile"),
                RouteRecord::new("class").named("ClassManagement"),
            ]),
            RouteRecord::catch_all().named("NotFound"),
        ])
    }

    /// Resolve a location, following redirect records. The query and hash of
    /// the original location are carried over to the redirect target.
    pub fn resolve(&self, location: &str) -> ResolvedRoute {
        let (mut path, suffix) = split_location(location);

        for _ in 0..MAX_REDIRECTS {
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            let Some(route) = self.routes.iter().find(|r| r.matches(&segments)) else {
                break;
            };

            match &route.redirect {
                Some(target) => {
                    let (target_path, _) = split_location(target);
                    path = target_path;
                }
                None => {
                    return ResolvedRoute {
                        full_path: format!("{}{}", path, suffix),
                        path,
                        name: route.name.clone(),
                        matched: route.chain.clone(),
                    };
                }
            }
        }

        ResolvedRoute {
            full_path: format!("{}{}", path, suffix),
            path,
            name: None,
            matched: Vec::new(),
        }
    }
}

fn flatten(records: &[RouteRecord], parent: &str, chain: &[RouteMeta], out: &mut Vec<FlatRoute>) {
    for record in records {
        let catch_all = record.path == CATCH_ALL;
        let full = if catch_all {
            CATCH_ALL.to_string()
        } else {
            join_path(parent, &record.path)
        };

        let mut record_chain = chain.to_vec();
        record_chain.push(RouteMeta {
            path: full.clone(),
            name: record.name.clone(),
            requires_auth: record.requires_auth,
        });

        out.push(FlatRoute {
            segments: full.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect(),
            catch_all,
            redirect: record.redirect.clone(),
            name: record.name.clone(),
            chain: record_chain.clone(),
        });

        if !record.children.is_empty() {
            flatten(&record.children, &full, &record_chain, out);
        }
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize_path(child);
    }
    normalize_path(&format!("{}/{}", parent, child))
}

fn normalize_path(path: &str) -> String {
    let joined = path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{}", joined)
}

/// Split `"/a/b?x=1#h"` into `("/a/b", "?x=1#h")`
fn split_location(location: &str) -> (String, String) {
    let idx = location.find(['?', '#']).unwrap_or(location.len());
    let (path, suffix) = location.split_at(idx);
    (normalize_path(path), suffix.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_routes_inherit_parent_auth_requirement() {
        let table = RouteTable::admin();
        let route = table.resolve("/app/class");

        assert_eq!(route.name.as_deref(), Some("ClassManagement"));
        assert_eq!(route.matched.len(), 2);
        assert!(route.requires_auth());
    }

    #[test]
    fn root_redirects_into_dashboard_keeping_query() {
        let table = RouteTable::admin();
        let route = table.resolve("/?tab=2");

        assert_eq!(route.path, "/app/dashboard");
        assert_eq!(route.full_path, "/app/dashboard?tab=2");
        assert!(route.requires_auth());
    }

    #[test]
    fn public_routes_do_not_require_auth() {
        let table = RouteTable::admin();
        assert!(!table.resolve("/login").requires_auth());
        assert!(!table.resolve("/register/").requires_auth());
    }

    #[test]
    fn unknown_paths_fall_through_to_not_found() {
        let table = RouteTable::admin();
        let route = table.resolve("/no/such/page");

        assert_eq!(route.name.as_deref(), Some("NotFound"));
        assert!(!route.requires_auth());
    }

    #[test]
    fn param_segments_match_any_value() {
        let table = RouteTable::new(vec![RouteRecord::new("/class/:id")
            .named("ClassDetail")
            .requires_auth(true)]);
        let route = table.resolve("/class/42");

        assert_eq!(route.name.as_deref(), Some("ClassDetail"));
        assert!(table.resolve("/class").matched.is_empty());
    }

    #[test]
    fn redirect_loops_stop_unmatched() {
        let table = RouteTable::new(vec![
            RouteRecord::new("/a").redirect_to("/b"),
            RouteRecord::new("/b").redirect_to("/a"),
        ]);
        let route = table.resolve("/a");
        assert!(route.matched.is_empty());
    }
}
