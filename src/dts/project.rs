//! File-tree materialization for `.d.ts` output.
//!
//! A [`Project`] is an ordered map of relative paths to source units;
//! each unit is an append-only list of declarations (interfaces, enums,
//! re-exports) rendered in insertion order. The layout engine only uses
//! this small surface; nothing here knows about services or endpoints.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct InterfaceProp {
    pub name: String,
    pub ty: String,
    pub optional: bool,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    pub exported: bool,
    pub docs: Vec<String>,
    pub properties: Vec<InterfaceProp>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    /// (member name, string value) pairs, in table order.
    pub members: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
enum Decl {
    Interface(Interface),
    Enum(EnumDecl),
    /// Re-export of another unit, as a module path like "./audio".
    Export(String),
}

/// One declaration file under construction.
#[derive(Debug, Default)]
pub struct SourceUnit {
    decls: Vec<Decl>,
}

impl SourceUnit {
    pub fn add_interface(&mut self, interface: Interface) {
        self.decls.push(Decl::Interface(interface));
    }

    pub fn has_interface(&self, name: &str) -> bool {
        self.decls
            .iter()
            .any(|d| matches!(d, Decl::Interface(i) if i.name == name))
    }

    pub fn add_enum(&mut self, decl: EnumDecl) {
        self.decls.push(Decl::Enum(decl));
    }

    pub fn add_export(&mut self, module: impl Into<String>) {
        self.decls.push(Decl::Export(module.into()));
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for decl in &self.decls {
            if !out.is_empty() {
                out.push('\n');
            }
            match decl {
                Decl::Export(module) => {
                    out.push_str(&format!("export * from '{module}';\n"));
                }
                Decl::Interface(i) => render_interface(&mut out, i),
                Decl::Enum(e) => render_enum(&mut out, e),
            }
        }
        out
    }
}

fn render_docs(out: &mut String, docs: &[String], indent: &str) {
    match docs {
        [] => {}
        [line] => out.push_str(&format!("{indent}/** {line} */\n")),
        lines => {
            out.push_str(&format!("{indent}/**\n"));
            for line in lines {
                out.push_str(&format!("{indent} * {line}\n"));
            }
            out.push_str(&format!("{indent} */\n"));
        }
    }
}

fn render_interface(out: &mut String, i: &Interface) {
    render_docs(out, &i.docs, "");
    let export = if i.exported { "export " } else { "" };
    if i.properties.is_empty() {
        out.push_str(&format!("{export}interface {} {{}}\n", i.name));
        return;
    }
    out.push_str(&format!("{export}interface {} {{\n", i.name));
    for p in &i.properties {
        render_docs(out, &p.docs, "    ");
        let marker = if p.optional { "?" } else { "" };
        out.push_str(&format!("    {}{marker}: {};\n", prop_name(&p.name), p.ty));
    }
    out.push_str("}\n");
}

fn render_enum(out: &mut String, e: &EnumDecl) {
    out.push_str(&format!("export enum {} {{\n", e.name));
    for (name, value) in &e.members {
        out.push_str(&format!("    {name} = \"{value}\",\n"));
    }
    out.push_str("}\n");
}

/// Quote property names the docs hand us that are not valid TypeScript
/// identifiers (`$` is valid; `/`, `.`, leading digits are not).
fn prop_name(name: &str) -> String {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if valid {
        name.to_string()
    } else {
        format!("\"{name}\"")
    }
}

/// In-memory declaration tree, persisted in one go.
#[derive(Debug, Default)]
pub struct Project {
    units: IndexMap<String, SourceUnit>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new empty unit. Paths are unique across the whole
    /// output set; a collision means two services mapped to the same
    /// module and must not be papered over.
    pub fn create_unit(&mut self, rel_path: impl Into<String>) -> anyhow::Result<&mut SourceUnit> {
        let rel_path = rel_path.into();
        if self.units.contains_key(&rel_path) {
            bail!("output module path collision: {rel_path}");
        }
        Ok(self.units.entry(rel_path).or_default())
    }

    pub fn units(&self) -> impl Iterator<Item = (&str, &SourceUnit)> {
        self.units.iter().map(|(p, u)| (p.as_str(), u))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Write every unit under `root`, clearing whatever a previous run
    /// left there.
    pub fn save(&self, root: &Path) -> anyhow::Result<()> {
        if root.exists() {
            fs::remove_dir_all(root)
                .with_context(|| format!("failed to clear output root {}", root.display()))?;
        }
        for (rel, unit) in &self.units {
            let path = root.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&path, unit.render())
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Ok(())
    }
}
