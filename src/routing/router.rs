//! Route lookup.
//!
//! # Responsibilities
//! - Hold the fixed exercise route table
//! - Look up the route for a request's method and path
//! - Distinguish "no such path" from "path exists under other methods"
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over five routes
//! - Explicit NotFound rather than silent default

use axum::http::Method;

use crate::routing::matcher::{PathTemplate, PathVars};
use crate::service::Operation;

/// One row of the route table.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub template: PathTemplate,
    pub operation: Operation,
}

/// Result of a lookup.
#[derive(Debug)]
pub enum RouteMatch<'t, 'p> {
    Matched {
        route: &'t Route,
        vars: PathVars<'p>,
    },
    /// The path matched, but only under these methods.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Ordered route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The exercise REST surface.
    pub fn exercises() -> Self {
        let route = |method, template, operation| Route {
            method,
            template: PathTemplate::new(template),
            operation,
        };
        Self::new(vec![
            route(Method::GET, "/v1/exercises/{id}", Operation::Get),
            route(Method::POST, "/v1/exercises", Operation::Create),
            route(Method::PATCH, "/v1/exercises/{id}", Operation::Update),
            route(Method::DELETE, "/v1/exercises/{id}", Operation::Delete),
            route(Method::GET, "/v1/exercises", Operation::List),
        ])
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn lookup<'t, 'p>(&'t self, method: &Method, path: &'p str) -> RouteMatch<'t, 'p> {
        let mut allowed = Vec::new();
        for route in &self.routes {
            if let Some(vars) = route.template.matches(path) {
                if route.method == *method {
                    return RouteMatch::Matched { route, vars };
                }
                if !allowed.contains(&route.method) {
                    allowed.push(route.method.clone());
                }
            }
        }

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed(allowed)
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::exercises()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operation(table: &RouteTable, method: Method, path: &str) -> Option<Operation> {
        match table.lookup(&method, path) {
            RouteMatch::Matched { route, .. } => Some(route.operation),
            _ => None,
        }
    }

    #[test]
    fn test_every_route_resolves() {
        let table = RouteTable::exercises();
        assert_eq!(operation(&table, Method::GET, "/v1/exercises/7"), Some(Operation::Get));
        assert_eq!(operation(&table, Method::POST, "/v1/exercises"), Some(Operation::Create));
        assert_eq!(operation(&table, Method::PATCH, "/v1/exercises/7"), Some(Operation::Update));
        assert_eq!(operation(&table, Method::DELETE, "/v1/exercises/7"), Some(Operation::Delete));
        assert_eq!(operation(&table, Method::GET, "/v1/exercises"), Some(Operation::List));
    }

    #[test]
    fn test_matched_route_captures_id() {
        let table = RouteTable::exercises();
        match table.lookup(&Method::PATCH, "/v1/exercises/abc123") {
            RouteMatch::Matched { vars, .. } => assert_eq!(vars.required("id").unwrap(), "abc123"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_wrong_method_lists_allowed() {
        let table = RouteTable::exercises();
        match table.lookup(&Method::PUT, "/v1/exercises/1") {
            RouteMatch::MethodNotAllowed(allowed) => {
                assert_eq!(allowed, vec![Method::GET, Method::PATCH, Method::DELETE]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            table.lookup(&Method::DELETE, "/v1/exercises"),
            RouteMatch::MethodNotAllowed(_)
        ));
    }

    #[test]
    fn test_unknown_path() {
        let table = RouteTable::exercises();
        assert!(matches!(table.lookup(&Method::GET, "/v2/exercises"), RouteMatch::NotFound));
        assert!(matches!(table.lookup(&Method::GET, "/"), RouteMatch::NotFound));
    }
}
