//! Go backend: declaration tree, naming rules and the emitters that fill a
//! [`ast::SourceFile`] before [`writer`] turns it into text.

pub mod ast;
pub mod handlers;
pub mod naming;
pub mod router;
pub mod security;
pub mod writer;

pub use ast::{Decl, Section, SourceFile};
pub use handlers::HandlerEmitter;
pub use security::SecurityEmitter;
pub use writer::SourceWriter;

pub const DEFAULT_RUNTIME_MODULE: &str = "github.com/pace/bricks";

pub const HTTP: &str = "net/http";
pub const CONTEXT: &str = "context";
pub const MUX: &str = "github.com/gorilla/mux";
pub const OPENTRACING: &str = "github.com/opentracing/opentracing-go";

/// Import paths of the runtime packages generated code calls into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePackages {
    pub runtime: String,
    pub errors: String,
    pub oauth2: String,
    pub apikey: String,
}

impl RuntimePackages {
    pub fn new(module: &str) -> Self {
        let module = module.trim_end_matches('/');
        Self {
            runtime: format!("{module}/http/jsonapi/runtime"),
            errors: format!("{module}/maintenance/errors"),
            oauth2: format!("{module}/http/oauth2"),
            apikey: format!("{module}/http/security/apikey"),
        }
    }
}

impl Default for RuntimePackages {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_MODULE)
    }
}
