//! In-memory declaration tree of the Go file being generated.
//!
//! Builders only ever append [`Decl`]s to a [`SourceFile`]; turning them into
//! text is left to the writer, which emits sections in a fixed order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoType {
    /// Type declared in the generated package.
    Named(String),
    /// Predeclared Go type such as `string` or `int64`.
    Builtin(&'static str),
    /// Exported type of an imported package, identified by its import path.
    Qualified { import: &'static str, name: &'static str },
    Pointer(Box<GoType>),
    Slice(Box<GoType>),
    Map(Box<GoType>, Box<GoType>),
    /// `interface{}`
    Any,
}

impl GoType {
    pub fn named(name: impl Into<String>) -> Self {
        GoType::Named(name.into())
    }

    pub fn pointer(self) -> Self {
        GoType::Pointer(Box::new(self))
    }

    pub fn slice(self) -> Self {
        GoType::Slice(Box::new(self))
    }

    pub fn is_slice(&self) -> bool {
        matches!(self, GoType::Slice(_))
    }

    /// The pointee for pointers, the type itself otherwise.
    pub fn without_pointer(self) -> Self {
        match self {
            GoType::Pointer(inner) => *inner,
            other => other,
        }
    }

    fn collect_imports(&self, imports: &mut BTreeSet<String>) {
        match self {
            GoType::Qualified { import, .. } => {
                imports.insert((*import).to_string());
            }
            GoType::Pointer(inner) | GoType::Slice(inner) => inner.collect_imports(imports),
            GoType::Map(key, value) => {
                key.collect_imports(imports);
                value.collect_imports(imports);
            }
            GoType::Named(_) | GoType::Builtin(_) | GoType::Any => {}
        }
    }
}

impl fmt::Display for GoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoType::Named(name) => f.write_str(name),
            GoType::Builtin(name) => f.write_str(name),
            GoType::Qualified { import, name } => {
                let package = import.rsplit('/').next().unwrap_or(import);
                write!(f, "{package}.{name}")
            }
            GoType::Pointer(inner) => write!(f, "*{inner}"),
            GoType::Slice(inner) => write!(f, "[]{inner}"),
            GoType::Map(key, value) => write!(f, "map[{key}]{value}"),
            GoType::Any => f.write_str("interface{}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: &'static str,
    pub value: String,
}

impl Tag {
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Empty for embedded fields.
    pub name: String,
    pub ty: GoType,
    pub tags: Vec<Tag>,
    pub doc: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: GoType) -> Self {
        Self {
            name: name.into(),
            ty,
            tags: Vec::new(),
            doc: None,
        }
    }

    pub fn embedded(ty: GoType) -> Self {
        Self::new("", ty)
    }

    pub fn tag(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    pub fn tag_string(&self) -> Option<String> {
        if self.tags.is_empty() {
            return None;
        }
        let tags: Vec<String> = self
            .tags
            .iter()
            .map(|t| format!("{}:\"{}\"", t.key, escape_tag_value(&t.value)))
            .collect();
        Some(format!("`{}`", tags.join(" ")))
    }
}

/// Tag values are unquoted by `reflect.StructTag`; the tag itself is a raw
/// string literal, so backticks can only appear as `\x60`.
fn escape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\x60"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceItem {
    Embedded(GoType),
    Method { doc: Option<String>, signature: String },
}

/// Statement lines with their nesting depth relative to the enclosing body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    lines: Vec<(usize, String)>,
    depth: usize,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push((self.depth, text.into()));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push((0, String::new()));
        self
    }

    /// Push `text` and indent everything after it.
    pub fn open(&mut self, text: impl Into<String>) -> &mut Self {
        self.line(text);
        self.depth += 1;
        self
    }

    /// Dedent and push `text`.
    pub fn close(&mut self, text: impl Into<String>) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.line(text)
    }

    /// Dedent, push `text` and indent again, as in `} else {`.
    pub fn reopen(&mut self, text: impl Into<String>) -> &mut Self {
        self.close(text);
        self.depth += 1;
        self
    }

    /// Splice `other` in at the current depth.
    pub fn append(&mut self, other: &Block) -> &mut Self {
        for (depth, text) in &other.lines {
            if text.is_empty() {
                self.lines.push((0, String::new()));
            } else {
                self.lines.push((self.depth + depth, text.clone()));
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines.iter().map(|(depth, text)| (*depth, text.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub doc: Vec<String>,
    /// e.g. `w *getArticleResponseWriter`
    pub receiver: Option<String>,
    pub name: String,
    pub params: String,
    pub results: String,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Struct {
        name: String,
        doc: Vec<String>,
        fields: Vec<Field>,
    },
    TypeDef {
        name: String,
        doc: Vec<String>,
        ty: GoType,
    },
    Interface {
        name: String,
        doc: Vec<String>,
        items: Vec<InterfaceItem>,
    },
    Var {
        name: String,
        doc: Vec<String>,
        value: Block,
    },
    Func(FuncDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Struct { name, .. }
            | Decl::TypeDef { name, .. }
            | Decl::Interface { name, .. }
            | Decl::Var { name, .. } => name,
            Decl::Func(func) => &func.name,
        }
    }

    fn collect_imports(&self, imports: &mut BTreeSet<String>) {
        match self {
            Decl::Struct { fields, .. } => fields.iter().for_each(|f| f.ty.collect_imports(imports)),
            Decl::TypeDef { ty, .. } => ty.collect_imports(imports),
            Decl::Interface { items, .. } => {
                for item in items {
                    if let InterfaceItem::Embedded(ty) = item {
                        ty.collect_imports(imports);
                    }
                }
            }
            Decl::Var { .. } | Decl::Func(_) => {}
        }
    }
}

/// Emission order of the generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    Security,
    Types,
    Handlers,
    Service,
    Router,
}

/// Everything that ends up in one generated Go file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub package: String,
    /// Top-level comment lines (title and description of the API).
    pub doc: Vec<String>,
    imports: BTreeSet<String>,
    decls: BTreeMap<Section, Vec<Decl>>,
}

impl SourceFile {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            doc: Vec::new(),
            imports: BTreeSet::new(),
            decls: BTreeMap::new(),
        }
    }

    /// Record an import used by code inside function bodies or values.
    pub fn import(&mut self, path: impl Into<String>) {
        self.imports.insert(path.into());
    }

    /// Record the imports a type used in a signature needs.
    pub fn import_type(&mut self, ty: &GoType) {
        ty.collect_imports(&mut self.imports);
    }

    pub fn push(&mut self, section: Section, decl: Decl) {
        decl.collect_imports(&mut self.imports);
        self.decls.entry(section).or_default().push(decl);
    }

    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    pub fn decls(&self, section: Section) -> &[Decl] {
        self.decls.get(&section).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn sections(&self) -> impl Iterator<Item = (Section, &[Decl])> {
        self.decls.iter().map(|(section, decls)| (*section, decls.as_slice()))
    }

    pub fn count(&self, name: &str) -> usize {
        self.decls
            .values()
            .flatten()
            .filter(|decl| decl.name() == name)
            .count()
    }
}
