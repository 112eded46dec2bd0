use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::types::{ModuleKind, SpecKind, Specifier};

/// Parse the import requests of a module, caching per file. Scripts are
/// parsed with oxc, stylesheets are scanned for `@import`, assets have no
/// imports.
pub fn imports_for(
    file: &PathBuf,
    cache: &DashMap<PathBuf, Vec<Specifier>>,
) -> Result<Vec<Specifier>> {
    if let Some(v) = cache.get(file) {
        trace!("Cache hit for imports: {}", file.display());
        return Ok(v.clone());
    }
    trace!("Parsing file for imports: {}", file.display());
    let src =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;

    let specs = match ModuleKind::of(file) {
        ModuleKind::Script => script_imports(file, &src),
        ModuleKind::Style => style_imports(&src),
        ModuleKind::Asset => Vec::new(),
    };

    debug!("Found {} import specifiers in {}", specs.len(), file.display());
    cache.insert(file.clone(), specs.clone());
    Ok(specs)
}

/// The contents of the first `<script>` block of a single-file component.
pub fn script_block(source: &str) -> Option<&str> {
    let open = source.find("<script")?;
    let body_start = open + source[open..].find('>')? + 1;
    let close = body_start + source[body_start..].find("</script>")?;
    Some(&source[body_start..close])
}

/// Syntax diagnostics for a script source, empty when it parses cleanly.
/// Vue components are checked on their script block only.
pub fn syntax_errors(path: &Path, source: &str) -> Vec<String> {
    let src = if path.extension().and_then(|e| e.to_str()) == Some("vue") {
        match script_block(source) {
            Some(block) => block,
            None => return Vec::new(),
        }
    } else {
        source
    };

    let allocator = Allocator::default();
    let ret = OxcParser::new(&allocator, src, source_type_for(path)).parse();
    ret.errors.iter().map(|e| e.to_string()).collect()
}

fn script_imports(file: &Path, source: &str) -> Vec<Specifier> {
    let ext = file.extension().and_then(|e| e.to_str());
    if ext == Some("json") {
        return Vec::new();
    }
    let src = if ext == Some("vue") {
        match script_block(source) {
            Some(block) => block,
            None => {
                trace!("No script block in {}", file.display());
                return Vec::new();
            }
        }
    } else {
        source
    };

    let allocator = Allocator::default();
    let ParserReturn { program, .. } =
        OxcParser::new(&allocator, src, source_type_for(file)).parse();

    let mut specs: Vec<Specifier> = Vec::new();

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                let req = decl.source.value.to_string();
                trace!("Found static import: '{}' in {}", req, file.display());
                specs.push(Specifier { request: req, kind: SpecKind::Static });
            }
            Statement::ExpressionStatement(es) => {
                extract_calls(&es.expression, &mut specs);
            }
            Statement::VariableDeclaration(vd) => {
                // const x = require('...'), possibly wrapped in other calls
                for decl in &vd.declarations {
                    if let Some(init) = &decl.init {
                        extract_calls(init, &mut specs);
                    }
                }
            }
            _ => {}
        }
    }

    specs
}

fn extract_calls(expr: &Expression, specs: &mut Vec<Specifier>) {
    match expr {
        Expression::CallExpression(ce) => {
            if let Expression::Identifier(callee) = &ce.callee
                && callee.name.as_str() == "require"
                && !ce.arguments.is_empty()
                && let Some(Expression::StringLiteral(sl)) = ce.arguments[0].as_expression()
            {
                trace!("Found require() call: '{}'", sl.value);
                specs.push(Specifier { request: sl.value.to_string(), kind: SpecKind::Static });
            }
            for arg in &ce.arguments {
                if let Some(arg_expr) = arg.as_expression() {
                    extract_calls(arg_expr, specs);
                }
            }
            extract_calls(&ce.callee, specs);
        }
        Expression::ImportExpression(ie) => {
            if let Expression::StringLiteral(sl) = &ie.source {
                trace!("Found dynamic import(): '{}'", sl.value);
                specs.push(Specifier { request: sl.value.to_string(), kind: SpecKind::Dynamic });
            }
        }
        Expression::ConditionalExpression(ce) => {
            extract_calls(&ce.test, specs);
            extract_calls(&ce.consequent, specs);
            extract_calls(&ce.alternate, specs);
        }
        Expression::AssignmentExpression(ae) => {
            extract_calls(&ae.right, specs);
        }
        Expression::ParenthesizedExpression(pe) => {
            extract_calls(&pe.expression, specs);
        }
        _ => {}
    }
}

fn style_imports(source: &str) -> Vec<Specifier> {
    // @import "a.css"; / @import 'theme.less'; — quoted form only
    let mut specs = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix("@import") else {
            continue;
        };
        let rest = rest.trim_start();
        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        if let Some(end) = rest[1..].find(quote) {
            let request = rest[1..1 + end].to_string();
            trace!("Found style import: '{}'", request);
            specs.push(Specifier { request, kind: SpecKind::Static });
        }
    }
    specs
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    let mut st = SourceType::default().with_jsx(matches!(ext, Some("jsx") | Some("vue")));

    // ESM heuristic - .mjs and component script blocks are ES modules
    if matches!(ext, Some("mjs") | Some("vue")) {
        st = st.with_module(true);
    }

    st
}
