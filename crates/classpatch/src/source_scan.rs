// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Finds declarations carrying a marker annotation in Java sources.
//!
//! Sources are parsed with the tree-sitter Java grammar. Only declarations are examined:
//! packages, types and the members of type bodies. Annotations inside method bodies, parameter
//! lists, local classes and anonymous classes are ignored.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{Level, event};
use tree_sitter::{Node, Parser};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::trigger::{ElementKind, MarkedElement};

/// The annotation type a [`BuildTrigger`](crate::BuildTrigger) reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Marker {
    qualified_name: String,
}

impl Marker {
    /// Creates a marker from the annotation type's qualified name.
    #[must_use]
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
        }
    }

    /// Returns the qualified name.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Returns the simple name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map_or(self.qualified_name.as_str(), |(_, simple)| simple)
    }

    /// Returns the package, or `""` for the default package.
    #[must_use]
    pub fn package(&self) -> &str {
        self.qualified_name.rsplit_once('.').map_or("", |(package, _)| package)
    }
}

/// An `import` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    /// The imported name, without a trailing `.*`.
    pub name: String,
    /// `import static`.
    pub is_static: bool,
    /// Ends in `.*`.
    pub wildcard: bool,
}

/// An annotation use, as written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// The annotation name, simple or qualified.
    pub name: String,
    /// 1-based source line.
    pub line: usize,
}

/// An annotated declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// What is declared.
    pub kind: ElementKind,
    /// The simple name; the full name for packages.
    pub name: String,
    /// Dotted qualified name for packages and types, `None` for members.
    pub qualified_name: Option<String>,
    /// Annotations on the declaration, in source order.
    pub annotations: Vec<Annotation>,
}

/// What a scan learned about one source file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompilationUnit {
    /// The file scanned, if any.
    pub path: Option<PathBuf>,
    /// The `package` declaration.
    pub package: Option<String>,
    /// `import` declarations.
    pub imports: Vec<Import>,
    /// Declarations carrying at least one annotation.
    pub declarations: Vec<Declaration>,
}

impl CompilationUnit {
    /// Returns the declarations annotated with `marker`, in source order.
    #[must_use]
    pub fn marked_elements(&self, marker: &Marker) -> Vec<MarkedElement> {
        self.declarations
            .iter()
            .filter_map(|decl| {
                let annotation = decl.annotations.iter().find(|a| self.refers_to(&a.name, marker))?;
                Some(MarkedElement {
                    kind: decl.kind,
                    name: decl.name.clone(),
                    qualified_name: decl.qualified_name.clone(),
                    source: self.path.clone(),
                    line: annotation.line,
                })
            })
            .collect()
    }

    /// Returns `true` if the annotation name `written` denotes `marker` in this unit.
    fn refers_to(&self, written: &str, marker: &Marker) -> bool {
        if written == marker.qualified_name() {
            return true;
        }
        if written != marker.simple_name() {
            return false;
        }
        if self.package.as_deref().unwrap_or("") == marker.package() {
            return true;
        }
        self.imports.iter().any(|import| {
            !import.is_static
                && if import.wildcard {
                    import.name == marker.package()
                } else {
                    import.name == marker.qualified_name()
                }
        })
    }
}

/// Scans one source file's text.
///
/// Text that does not parse cleanly still yields whatever declarations the parser recovered.
///
/// # Errors
///
/// Returns [`Error::SourceParse`] if the Java grammar cannot be loaded or no syntax tree is
/// produced.
pub fn scan_source(path: Option<&Path>, text: &str) -> Result<CompilationUnit> {
    JavaParser::new(&source_name(path))?.scan(path, text)
}

/// Scans every `.java` file under `root`, in file-name order.
///
/// # Errors
///
/// Returns [`Error::Io`] if the tree cannot be walked or a file cannot be read, and
/// [`Error::SourceParse`] as for [`scan_source`].
pub fn scan_tree(root: impl AsRef<Path>) -> Result<Vec<CompilationUnit>> {
    let root = root.as_ref();
    let mut parser = JavaParser::new(&root.display().to_string())?;
    let mut units = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::Io { path, source: e.into() }
        })?;
        if !entry.file_type().is_file() || entry.path().extension() != Some(OsStr::new("java")) {
            continue;
        }
        let text = std::fs::read_to_string(entry.path()).map_err(|e| Error::io(entry.path(), e))?;
        units.push(parser.scan(Some(entry.path()), &text)?);
    }
    event!(
        Level::DEBUG,
        message = "source tree scanned",
        root = %root.display(),
        units = units.len()
    );
    Ok(units)
}

/// Returns every element in `units` annotated with `marker`, in scan order.
#[must_use]
pub fn marked_elements(units: &[CompilationUnit], marker: &Marker) -> Vec<MarkedElement> {
    units.iter().flat_map(|unit| unit.marked_elements(marker)).collect()
}

fn source_name(path: Option<&Path>) -> String {
    path.map_or_else(|| "<input>".to_owned(), |path| path.display().to_string())
}

struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    fn new(source_name: &str) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| Error::SourceParse {
                source_name: source_name.to_owned(),
                reason: format!("the Java grammar cannot be loaded: {e}"),
            })?;
        Ok(Self { parser })
    }

    fn scan(&mut self, path: Option<&Path>, text: &str) -> Result<CompilationUnit> {
        let tree = self.parser.parse(text, None).ok_or_else(|| Error::SourceParse {
            source_name: source_name(path),
            reason: "the parser produced no syntax tree".to_owned(),
        })?;
        if tree.root_node().has_error() {
            event!(Level::DEBUG, message = "source has syntax errors", source = %source_name(path));
        }

        let mut builder = UnitBuilder {
            source: text.as_bytes(),
            unit: CompilationUnit {
                path: path.map(Path::to_path_buf),
                ..CompilationUnit::default()
            },
        };
        builder.program(tree.root_node());
        Ok(builder.unit)
    }
}

fn children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.child_count()).filter_map(move |i| node.child(i))
}

fn is_name(node: Node<'_>) -> bool {
    matches!(node.kind(), "identifier" | "scoped_identifier")
}

/// Collects the declarations of one syntax tree into a [`CompilationUnit`].
struct UnitBuilder<'s> {
    source: &'s [u8],
    unit: CompilationUnit,
}

impl UnitBuilder<'_> {
    /// The node's text with whitespace removed, so `a . b` reads as `a.b`.
    fn text(&self, node: Node<'_>) -> String {
        node.utf8_text(self.source)
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    fn program(&mut self, root: Node<'_>) {
        let mut enclosing = Vec::new();
        for child in children(root) {
            match child.kind() {
                "package_declaration" => self.package(child),
                "import_declaration" => self.import(child),
                _ => self.declaration(child, &mut enclosing),
            }
        }
    }

    fn package(&mut self, node: Node<'_>) {
        let Some(name) = children(node).find(|c| is_name(*c)).map(|c| self.text(c)) else {
            return;
        };
        let annotations: Vec<Annotation> = children(node).filter_map(|c| self.annotation(c)).collect();
        if !annotations.is_empty() {
            self.unit.declarations.push(Declaration {
                kind: ElementKind::Package,
                name: name.clone(),
                qualified_name: Some(name.clone()),
                annotations,
            });
        }
        self.unit.package = Some(name);
    }

    fn import(&mut self, node: Node<'_>) {
        let Some(name) = children(node).find(|c| is_name(*c)).map(|c| self.text(c)) else {
            return;
        };
        self.unit.imports.push(Import {
            name,
            is_static: children(node).any(|c| c.kind() == "static"),
            wildcard: children(node).any(|c| c.kind() == "asterisk"),
        });
    }

    fn annotation(&self, node: Node<'_>) -> Option<Annotation> {
        if !matches!(node.kind(), "marker_annotation" | "annotation") {
            return None;
        }
        let name = node.child_by_field_name("name")?;
        Some(Annotation {
            name: self.text(name),
            line: node.start_position().row + 1,
        })
    }

    /// Annotations in the declaration's `modifiers`, in source order.
    fn annotations(&self, node: Node<'_>) -> Vec<Annotation> {
        children(node)
            .filter(|c| c.kind() == "modifiers")
            .flat_map(children)
            .filter_map(|c| self.annotation(c))
            .collect()
    }

    /// Records `node` if it is an annotated declaration, then descends into type bodies.
    fn declaration(&mut self, node: Node<'_>, enclosing: &mut Vec<String>) {
        let (kind, name) = match node.kind() {
            "class_declaration" => (ElementKind::Class, node.child_by_field_name("name")),
            "interface_declaration" => (ElementKind::Interface, node.child_by_field_name("name")),
            "enum_declaration" => (ElementKind::Enum, node.child_by_field_name("name")),
            "record_declaration" => (ElementKind::Record, node.child_by_field_name("name")),
            "annotation_type_declaration" => (ElementKind::AnnotationType, node.child_by_field_name("name")),
            "method_declaration" | "annotation_type_element_declaration" => {
                (ElementKind::Method, node.child_by_field_name("name"))
            }
            "constructor_declaration" | "compact_constructor_declaration" => {
                (ElementKind::Constructor, node.child_by_field_name("name"))
            }
            "enum_constant" => (ElementKind::Field, node.child_by_field_name("name")),
            // The first declarator names the element, as in `@A int first, second;`.
            "field_declaration" | "constant_declaration" => (
                ElementKind::Field,
                node.child_by_field_name("declarator")
                    .and_then(|declarator| declarator.child_by_field_name("name")),
            ),
            _ => return,
        };
        let Some(name) = name.map(|n| self.text(n)) else {
            return;
        };

        let is_type = matches!(
            kind,
            ElementKind::Class
                | ElementKind::Interface
                | ElementKind::Enum
                | ElementKind::Record
                | ElementKind::AnnotationType
        );
        let annotations = self.annotations(node);
        if !annotations.is_empty() {
            let qualified_name = is_type.then(|| self.qualify(enclosing, &name));
            self.unit.declarations.push(Declaration {
                kind,
                name: name.clone(),
                qualified_name,
                annotations,
            });
        }

        if !is_type {
            return;
        }
        if let Some(body) = node.child_by_field_name("body") {
            enclosing.push(name);
            self.body(body, enclosing);
            let _ = enclosing.pop();
        }
    }

    fn body(&mut self, body: Node<'_>, enclosing: &mut Vec<String>) {
        for member in children(body) {
            if member.kind() == "enum_body_declarations" {
                self.body(member, enclosing);
            } else {
                self.declaration(member, enclosing);
            }
        }
    }

    fn qualify(&self, enclosing: &[String], name: &str) -> String {
        self.unit
            .package
            .iter()
            .map(String::as_str)
            .chain(enclosing.iter().map(String::as_str))
            .chain([name])
            .collect::<Vec<_>>()
            .join(".")
    }
}
