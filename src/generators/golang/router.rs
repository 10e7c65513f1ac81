use super::ast::{Block, Decl, FuncDecl, Section, SourceFile};
use super::handlers::HandlerEmitter;
use super::naming::{comment_lines, go_quote};
use super::security::SecurityEmitter;
use super::MUX;
use crate::operation_processor::Route;
use crate::parsers::Document;

/// Emit `Router`, registering `routes` in the given order on one sub-router
/// per server path prefix.
pub fn build_router(
    document: &Document,
    routes: &[Route<'_>],
    handlers: &HandlerEmitter<'_>,
    security: &SecurityEmitter,
    file: &mut SourceFile,
) {
    file.import(MUX);

    let mut body = Block::new();
    body.line("router := mux.NewRouter()");

    let init = security.build_init();
    if !init.is_empty() {
        body.blank().line("// Initialize authentication backend").append(&init);
    }

    let mut subrouter = 0;
    for prefix in document.server_prefixes() {
        body.blank();
        let target = if prefix == "/" {
            body.line("// Routes registered on the root path");
            "router".to_string()
        } else {
            subrouter += 1;
            let name = format!("s{subrouter}");
            body.line(format!("// Subrouter {name} - Path: {prefix}"))
                .line(format!("{name} := router.PathPrefix({}).Subrouter()", go_quote(&prefix)));
            name
        };

        for route in routes {
            let mut registration = format!(
                "{target}.Methods({}).Path({})",
                go_quote(route.method),
                go_quote(&route.url)
            );
            if !route.query_values.is_empty() {
                let pairs: Vec<String> = route
                    .query_values
                    .iter()
                    .flat_map(|(key, value)| [go_quote(key), go_quote(value)])
                    .collect();
                registration.push_str(&format!(".Queries({})", pairs.join(", ")));
            }
            registration.push_str(&format!(
                ".Handler({}({})).Name({})",
                route.handler,
                handlers.handler_args(),
                go_quote(&route.service_func)
            ));
            body.line(registration);
        }
    }
    body.blank().line("return router");

    let mut doc = vec![format!("// Router implements: {}", document.title())];
    if let Some(description) = document.description() {
        doc.push("//".to_string());
        doc.extend(comment_lines(description));
    }

    file.push(
        Section::Router,
        Decl::Func(FuncDecl {
            doc,
            receiver: None,
            name: "Router".to_string(),
            params: handlers.handler_params(),
            results: "*mux.Router".to_string(),
            body,
        }),
    );
}
