//! RouteBuilder: one [`Route`] per (path, operation) pair, plus the
//! specificity order the router table is emitted in.

use crate::error::{Error, Result};
use crate::generators::golang::naming::{go_name, lower_first, NameSet};
use crate::parsers::Document;
use crate::registry::TypeRegistry;
use openapiv3::{Operation, Parameter, ReferenceOr};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Immutable once built; consumed by the handler emitter and the router table.
#[derive(Debug, Clone)]
pub struct Route<'a> {
    pub method: &'static str,
    /// Path key as written in the document.
    pub pattern: String,
    /// Path part of the pattern, `{param}` style.
    pub url: String,
    /// Static query literals the route is restricted to, e.g. `filter[status]=valid`.
    pub query_values: BTreeMap<String, String>,
    pub handler: String,
    pub service_func: String,
    pub request_type: String,
    pub response_type: String,
    pub response_type_impl: String,
    pub operation: &'a Operation,
    pub path_parameters: &'a [ReferenceOr<Parameter>],
}

impl Route<'_> {
    /// Number of `/`-separated segments of the URL.
    pub fn segments(&self) -> usize {
        self.url.split('/').count()
    }

    /// Number of `{param}` placeholders.
    pub fn wildcards(&self) -> usize {
        self.url.split('/').filter(|s| is_placeholder(s)).count()
    }

    pub fn query_constraints(&self) -> usize {
        self.query_values.len()
    }
}

fn is_placeholder(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

#[derive(Debug, Default)]
pub struct RouteBuilder {
    names: NameSet,
}

impl RouteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes of every operation of `document`, in document order.
    pub fn build_routes<'a>(&mut self, document: &'a Document, registry: &mut TypeRegistry) -> Result<Vec<Route<'a>>> {
        document
            .operations()?
            .into_iter()
            .map(|op| self.build_route(op.method, op.operation, op.path, op.path_parameters, registry))
            .collect()
    }

    pub fn build_route<'a>(
        &mut self,
        method: &'static str,
        operation: &'a Operation,
        pattern: &str,
        path_parameters: &'a [ReferenceOr<Parameter>],
        registry: &mut TypeRegistry,
    ) -> Result<Route<'a>> {
        let (url, query_values) = parse_pattern(pattern)?;

        let base = match &operation.operation_id {
            Some(id) if !id.trim().is_empty() => go_name(id),
            _ => {
                let generated = generated_name(method, &url);
                tracing::warn!(
                    method,
                    pattern,
                    name = %generated,
                    "operation has no operationId, generated name changes whenever the path does"
                );
                generated
            }
        };

        // the operation name must not clash with other routes or with schema types
        let name = loop {
            let candidate = self.names.unique(&base);
            let taken = [
                format!("{candidate}Handler"),
                format!("{candidate}Request"),
                format!("{candidate}ResponseWriter"),
            ]
            .iter()
            .any(|n| registry.is_taken(n));
            if !taken {
                break candidate;
            }
        };

        let route = Route {
            method,
            pattern: pattern.to_string(),
            url,
            query_values,
            handler: format!("{name}Handler"),
            request_type: format!("{name}Request"),
            response_type: format!("{name}ResponseWriter"),
            response_type_impl: lower_first(&format!("{name}ResponseWriter")),
            service_func: name,
            operation,
            path_parameters,
        };
        registry.register(&route.handler);
        registry.register(&route.request_type);
        registry.register(&route.response_type);
        Ok(route)
    }
}

/// Split a route pattern into its path and its static query constraints.
/// Ruby style `:param` segments are rewritten to `{param}`.
pub fn parse_pattern(pattern: &str) -> Result<(String, BTreeMap<String, String>)> {
    let (path, query) = match pattern.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (pattern, None),
    };

    let url = path
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => {
                tracing::warn!(pattern, segment, "ruby style path parameter, use {{{name}}} instead");
                format!("{{{name}}}")
            }
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/");

    let mut query_values = BTreeMap::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match query_values.get(key.as_ref()) {
                Some(existing) if existing != &value => {
                    return Err(Error::Route(format!(
                        "pattern {pattern:?} constrains query key {key:?} to both {existing:?} and {value:?}"
                    )));
                }
                Some(_) => {}
                None => {
                    query_values.insert(key.into_owned(), value.into_owned());
                }
            }
        }
    }

    Ok((url, query_values))
}

fn generated_name(method: &str, url: &str) -> String {
    let mut name = go_name(&method.to_ascii_lowercase());
    for segment in url.split('/').filter(|s| !s.is_empty()) {
        name.push_str(&go_name(segment));
    }
    name
}

/// `Less` when `a` has to be tried before `b`: more segments first, then fewer
/// placeholders, then more query constraints. Everything else is a tie.
pub fn compare_specificity(a: &Route<'_>, b: &Route<'_>) -> Ordering {
    b.segments()
        .cmp(&a.segments())
        .then_with(|| a.wildcards().cmp(&b.wildcards()))
        .then_with(|| b.query_constraints().cmp(&a.query_constraints()))
}

/// Stable sort by [`compare_specificity`]; ties keep declaration order.
/// Ties between routes that can match the same request are logged, since
/// only their declaration order decides which one the dispatcher picks.
pub fn sort_by_specificity(routes: &mut [Route<'_>]) {
    routes.sort_by(compare_specificity);

    for (i, a) in routes.iter().enumerate() {
        for b in routes[i + 1..].iter() {
            if compare_specificity(a, b) != Ordering::Equal {
                break;
            }
            if a.method == b.method && may_overlap(a, b) {
                tracing::warn!(
                    method = a.method,
                    first = %a.pattern,
                    second = %b.pattern,
                    "routes are equally specific, keeping declaration order"
                );
            }
        }
    }
}

fn may_overlap(a: &Route<'_>, b: &Route<'_>) -> bool {
    a.url
        .split('/')
        .zip(b.url.split('/'))
        .all(|(x, y)| x == y || is_placeholder(x) || is_placeholder(y))
        && a.query_values
            .iter()
            .all(|(k, v)| b.query_values.get(k).map_or(true, |w| w == v))
}
