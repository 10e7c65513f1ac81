//! SourceWriter: serializes a [`SourceFile`] into Go source text.
//!
//! The file skeleton (header, package clause, import block) is a tera
//! template; declarations are rendered here with tab indentation and struct
//! fields aligned the way gofmt does.

use super::ast::{Block, Decl, Field, FuncDecl, InterfaceItem, Section, SourceFile};
use crate::error::Result;
use tera::{Context, Tera};

pub const GENERATED_HEADER: &str = "// Code generated by jsonapi-gen, DO NOT EDIT.";

const FILE_TEMPLATE: &str = r#"{{ header }}

{% for line in doc %}{{ line }}
{% endfor %}package {{ package }}
{% if has_imports %}
import (
{% for path in std_imports %}	"{{ path }}"
{% endfor %}{% if has_both %}
{% endif %}{% for path in external_imports %}	"{{ path }}"
{% endfor %})
{% endif %}
{{ body }}"#;

#[derive(Debug, Default)]
pub struct SourceWriter;

impl SourceWriter {
    pub fn new() -> Self {
        Self
    }

    /// Render `file`. Identical input always yields identical output.
    pub fn emit(&self, file: &SourceFile) -> Result<String> {
        let (std_imports, external_imports): (Vec<&String>, Vec<&String>) =
            file.imports().iter().partition(|path| is_std(path));

        let mut rendered = Vec::new();
        for (section, decls) in file.sections() {
            let mut decls: Vec<&Decl> = decls.iter().collect();
            if section == Section::Types {
                decls.sort_by(|a, b| a.name().cmp(b.name()));
            }
            rendered.extend(decls.into_iter().map(render_decl));
        }

        let mut context = Context::new();
        context.insert("header", GENERATED_HEADER);
        context.insert("doc", &file.doc);
        context.insert("package", &file.package);
        context.insert("has_imports", &!file.imports().is_empty());
        context.insert("has_both", &(!std_imports.is_empty() && !external_imports.is_empty()));
        context.insert("std_imports", &std_imports);
        context.insert("external_imports", &external_imports);
        context.insert("body", &rendered.join("\n"));

        Ok(Tera::one_off(FILE_TEMPLATE, &context, false)?)
    }
}

/// Standard library import paths have no dot in their first element.
fn is_std(path: &str) -> bool {
    !path.split('/').next().unwrap_or(path).contains('.')
}

fn render_decl(decl: &Decl) -> String {
    let mut out = String::new();
    let doc = match decl {
        Decl::Struct { doc, .. }
        | Decl::TypeDef { doc, .. }
        | Decl::Interface { doc, .. }
        | Decl::Var { doc, .. } => doc,
        Decl::Func(func) => &func.doc,
    };
    for line in doc {
        out.push_str(line);
        out.push('\n');
    }

    match decl {
        Decl::Struct { name, fields, .. } => {
            out.push_str(&format!("type {name} struct {{\n"));
            render_fields(fields, &mut out);
            out.push_str("}\n");
        }
        Decl::TypeDef { name, ty, .. } => {
            out.push_str(&format!("type {name} {ty}\n"));
        }
        Decl::Interface { name, items, .. } => {
            out.push_str(&format!("type {name} interface {{\n"));
            for item in items {
                match item {
                    InterfaceItem::Embedded(ty) => out.push_str(&format!("\t{ty}\n")),
                    InterfaceItem::Method { doc, signature } => {
                        if let Some(doc) = doc {
                            out.push_str(&format!("\t{doc}\n"));
                        }
                        out.push_str(&format!("\t{signature}\n"));
                    }
                }
            }
            out.push_str("}\n");
        }
        Decl::Var { name, value, .. } => {
            let mut lines = value.lines();
            let first = lines.next().map(|(_, text)| text).unwrap_or("nil");
            out.push_str(&format!("var {name} = {first}\n"));
            for (depth, text) in lines {
                push_line(&mut out, depth, text);
            }
        }
        Decl::Func(func) => render_func(func, &mut out),
    }
    out
}

fn render_func(func: &FuncDecl, out: &mut String) {
    out.push_str("func ");
    if let Some(receiver) = &func.receiver {
        out.push_str(&format!("({receiver}) "));
    }
    out.push_str(&format!("{}({})", func.name, func.params));
    if !func.results.is_empty() {
        out.push(' ');
        out.push_str(&func.results);
    }
    out.push_str(" {\n");
    render_block(&func.body, 1, out);
    out.push_str("}\n");
}

fn render_block(block: &Block, indent: usize, out: &mut String) {
    for (depth, text) in block.lines() {
        push_line(out, depth + indent, text);
    }
}

fn push_line(out: &mut String, depth: usize, text: &str) {
    if !text.is_empty() {
        out.push_str(&"\t".repeat(depth));
        out.push_str(text);
    }
    out.push('\n');
}

fn render_fields(fields: &[Field], out: &mut String) {
    let named = fields.iter().filter(|f| !f.name.is_empty());
    let name_width = named.clone().map(|f| f.name.len()).max().unwrap_or(0);
    let type_width = named
        .filter(|f| !f.tags.is_empty())
        .map(|f| f.ty.to_string().len())
        .max()
        .unwrap_or(0);

    for field in fields {
        if let Some(doc) = &field.doc {
            out.push_str(&format!("\t{doc}\n"));
        }
        let ty = field.ty.to_string();
        if field.name.is_empty() {
            out.push_str(&format!("\t{ty}\n"));
            continue;
        }
        let line = match field.tag_string() {
            Some(tags) => format!("\t{:name_width$} {:type_width$} {tags}", field.name, ty),
            None => format!("\t{:name_width$} {ty}", field.name),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::golang::ast::GoType;

    #[test]
    fn test_emit_file() {
        let mut file = SourceFile::new("articles");
        file.doc.push("// Package articles serves articles".to_string());
        file.import("github.com/gorilla/mux");
        file.push(
            Section::Types,
            Decl::Struct {
                name: "Zebra".to_string(),
                doc: vec!["// Zebra ...".to_string()],
                fields: vec![
                    Field::new("ID", GoType::Builtin("string")).tag("json", "id"),
                    Field::new(
                        "CreatedAt",
                        GoType::Qualified {
                            import: "time",
                            name: "Time",
                        },
                    )
                    .tag("json", "createdAt"),
                ],
            },
        );
        file.push(
            Section::Types,
            Decl::TypeDef {
                name: "Alpha".to_string(),
                doc: vec![],
                ty: GoType::Builtin("string"),
            },
        );
        let mut body = Block::new();
        body.line("return mux.NewRouter()");
        file.push(
            Section::Router,
            Decl::Func(FuncDecl {
                doc: vec![],
                receiver: None,
                name: "Router".to_string(),
                params: String::new(),
                results: "*mux.Router".to_string(),
                body,
            }),
        );

        let source = SourceWriter::new().emit(&file).unwrap();
        let expected = "// Code generated by jsonapi-gen, DO NOT EDIT.

// Package articles serves articles
package articles

import (
\t\"time\"

\t\"github.com/gorilla/mux\"
)

type Alpha string

// Zebra ...
type Zebra struct {
\tID        string    `json:\"id\"`
\tCreatedAt time.Time `json:\"createdAt\"`
}

func Router() *mux.Router {
\treturn mux.NewRouter()
}
";
        assert_eq!(source, expected);
    }

    #[test]
    fn test_is_std() {
        assert!(is_std("net/http"));
        assert!(is_std("encoding/json"));
        assert!(!is_std("github.com/gorilla/mux"));
    }
}
