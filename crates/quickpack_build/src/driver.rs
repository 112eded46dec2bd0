use anyhow::{Context, Result, anyhow};
use dashmap::DashMap;
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use quickpack_assets::{AssetDisposition, classify};
use quickpack_chunks::{ChunkPlan, ModuleGraph, assign_chunks, build_graph};
use quickpack_core::{BuildConfig, ModuleKind, Specifier};

use crate::{
    collector::copy_entries,
    config::Config,
    emitter,
    html::generate_html,
    transform,
    types::{AssetOutput, BuildResult, EmittedAsset, EmittedChunk},
};

/// Run a full build: clean the output directory, walk the module graph,
/// partition it, transform every module, classify assets and emit the
/// hashed output tree with its HTML entry document.
///
/// The whole run is a pure function of the source tree and the loaded
/// configuration; two runs over identical input produce identical output.
pub fn run_build(mut cfg: Config) -> Result<BuildResult> {
    info!("Starting build");
    cfg.initialize()?;
    let root = cfg.root()?.clone();
    let bc = cfg.build()?.clone();

    let entry = root.join(&bc.entry);
    if !entry.is_file() {
        return Err(anyhow!("entry file {} does not exist", entry.display()));
    }
    let entry = entry.canonicalize().unwrap_or(entry);
    let entry_chunk = entry
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "main".to_string());

    let out_dir = root.join(&bc.output.path);
    emitter::clean_output(&out_dir)?;

    // Thread-safe caches shared across the parallel transform stage
    let import_cache: Arc<DashMap<PathBuf, Vec<Specifier>>> = Arc::new(DashMap::new());
    let resolve_cache: Arc<DashMap<(PathBuf, String), Option<PathBuf>>> = Arc::new(DashMap::new());

    let graph = build_graph(&root, &bc.resolve, &entry, &import_cache, &resolve_cache)?;
    info!("Module graph has {} modules", graph.order.len());

    let plan = assign_chunks(&graph, &bc.split_chunks, &entry_chunk);
    debug!("Partitioned into {} bundles", plan.chunks.len());

    let transformed = transform_modules(&root, &bc, &graph)?;

    let (asset_refs, assets) = classify_assets(&root, &bc, &graph, &out_dir)?;

    let (chunks, css) =
        emit_bundles(&root, &bc, &graph, &plan, &out_dir, &transformed, &asset_refs)?;

    let html_file = emit_html(&root, &bc, &out_dir, &css, &chunks)?;

    let copied_files = copy_entries(&root, &out_dir, &bc.copy)?;

    info!(
        "Build complete: {} bundles, {} css files, {} assets",
        chunks.len(),
        css.len(),
        assets.len()
    );
    Ok(BuildResult {
        chunks,
        css,
        assets,
        html: Some(html_file),
        copied_files,
        files_analyzed: import_cache.len(),
    })
}

fn rel_display(root: &Path, p: &Path) -> String {
    p.strip_prefix(root).unwrap_or(p).to_string_lossy().to_string()
}

/// Run every script and style module through its transformer chain, in
/// parallel. The first unrecoverable transformer failure aborts the build.
fn transform_modules(
    root: &Path,
    bc: &BuildConfig,
    graph: &ModuleGraph,
) -> Result<HashMap<PathBuf, String>> {
    let minify = bc.mode.is_production();
    graph
        .order
        .par_iter()
        .filter(|p| graph.modules[*p].kind != ModuleKind::Asset)
        .map(|p| {
            let rel = rel_display(root, p);
            trace!("Transforming {}", rel);
            let source = fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            let rule = transform::rule_for(&bc.rules, p)
                .ok_or_else(|| anyhow!("no transformer rule matches {}", rel))?;
            let out = transform::apply_chain(&rel, p, source, rule, minify)?;
            Ok((p.clone(), out))
        })
        .collect()
}

/// Classify every asset module: inline small ones as data URIs, emit the
/// rest under their category subdirectory. Returns the per-asset public
/// reference used by the bundle stubs.
fn classify_assets(
    root: &Path,
    bc: &BuildConfig,
    graph: &ModuleGraph,
    out_dir: &Path,
) -> Result<(HashMap<PathBuf, String>, Vec<EmittedAsset>)> {
    let mut refs = HashMap::new();
    let mut emitted = Vec::new();

    for p in graph.order.iter().filter(|p| graph.modules[*p].kind == ModuleKind::Asset) {
        let rel = rel_display(root, p);
        let bytes =
            fs::read(p).with_context(|| format!("failed to read {}", p.display()))?;
        let name = p.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        let ext =
            p.extension().map(|e| e.to_string_lossy().to_string()).unwrap_or_default();

        match classify(&name, &ext, &bytes, &bc.assets) {
            AssetDisposition::Inline { data_uri } => {
                debug!("Inlined asset {} ({} bytes)", rel, bytes.len());
                refs.insert(p.clone(), data_uri);
                emitted.push(EmittedAsset {
                    source: rel,
                    output: AssetOutput::Inlined { bytes: bytes.len() as u64 },
                });
            }
            AssetDisposition::Emit { file, public } => {
                emitter::write_file(out_dir, &file, &bytes)?;
                debug!("Emitted asset {} -> {}", rel, file);
                refs.insert(p.clone(), format!("{}{}", bc.output.public_path, public));
                emitted.push(EmittedAsset {
                    source: rel,
                    output: AssetOutput::File { path: file, bytes: bytes.len() as u64 },
                });
            }
        }
    }
    Ok((refs, emitted))
}

/// Assemble and write one JS bundle (and one CSS file, when the bundle
/// carries styles) per chunk, in plan order.
fn emit_bundles(
    root: &Path,
    bc: &BuildConfig,
    graph: &ModuleGraph,
    plan: &ChunkPlan,
    out_dir: &Path,
    transformed: &HashMap<PathBuf, String>,
    asset_refs: &HashMap<PathBuf, String>,
) -> Result<(Vec<EmittedChunk>, Vec<EmittedChunk>)> {
    // An asset's stub lands in one of its importers' bundles (the
    // alphabetically-first, for determinism), so the data URI or hashed
    // URL is visible where the asset is referenced
    let mut asset_stubs: HashMap<String, Vec<(String, String)>> = HashMap::new();
    for p in graph.order.iter().filter(|p| graph.modules[*p].kind == ModuleKind::Asset) {
        let Some(url) = asset_refs.get(p) else { continue };
        let owner = graph
            .importers
            .get(p)
            .into_iter()
            .flatten()
            .filter_map(|importer| plan.assignments.get(importer))
            .min()
            .cloned();
        let Some(owner) = owner else { continue };
        asset_stubs.entry(owner).or_default().push((rel_display(root, p), url.clone()));
    }

    let mut chunks = Vec::new();
    let mut css = Vec::new();

    for chunk in &plan.chunks {
        let mut js_body = String::new();
        let mut js_sources = Vec::new();
        let mut css_body = String::new();
        let mut css_sources = Vec::new();

        for module in &chunk.modules {
            let rel = rel_display(root, module);
            let Some(source) = transformed.get(module) else { continue };
            match graph.modules[module].kind {
                ModuleKind::Style => {
                    css_body.push_str(&format!("/* {} */\n", rel));
                    css_body.push_str(source);
                    if !css_body.ends_with('\n') {
                        css_body.push('\n');
                    }
                    css_sources.push(rel);
                }
                _ => {
                    js_body.push_str(&format!("// {}\n", rel));
                    js_body.push_str(source);
                    if !js_body.ends_with('\n') {
                        js_body.push('\n');
                    }
                    js_sources.push(rel);
                }
            }
        }

        if let Some(stubs) = asset_stubs.get(chunk.name.as_str()) {
            for (rel, url) in stubs {
                js_body.push_str(&format!(
                    "// {} (asset)\nvar {} = \"{}\";\n",
                    rel,
                    asset_ident(rel),
                    url
                ));
            }
        }

        if !js_body.is_empty() {
            let emitted = emitter::write_js_chunk(
                out_dir,
                &bc.output,
                bc.devtool.as_deref(),
                &chunk.name,
                js_body,
                &js_sources,
            )?;
            debug!("Emitted bundle {} -> {}", chunk.name, emitted.file);
            chunks.push(emitted);
        }
        if !css_body.is_empty() {
            let emitted =
                emitter::write_css_chunk(out_dir, &bc.output, &chunk.name, css_body, &css_sources)?;
            debug!("Emitted css {} -> {}", chunk.name, emitted.file);
            css.push(emitted);
        }
    }

    Ok((chunks, css))
}

fn asset_ident(rel: &str) -> String {
    let mut ident = String::from("__asset_");
    for ch in rel.chars() {
        if ch.is_ascii_alphanumeric() {
            ident.push(ch);
        } else {
            ident.push('_');
        }
    }
    ident
}

/// Generate `index.html` referencing the emitted CSS and JS by their
/// hashed names, copying the favicon alongside when configured.
fn emit_html(
    root: &Path,
    bc: &BuildConfig,
    out_dir: &Path,
    css: &[EmittedChunk],
    chunks: &[EmittedChunk],
) -> Result<String> {
    let template_path = root.join(&bc.html.template);
    let template = if template_path.is_file() {
        Some(
            fs::read_to_string(&template_path)
                .with_context(|| format!("failed to read {}", template_path.display()))?,
        )
    } else {
        warn!("HTML template {} not found, using built-in scaffold", template_path.display());
        None
    };

    let favicon = match &bc.html.favicon {
        Some(favicon) => {
            let src = root.join(favicon);
            if src.is_file() {
                let name = src
                    .file_name()
                    .map(|f| f.to_string_lossy().to_string())
                    .unwrap_or_else(|| "favicon.ico".to_string());
                fs::copy(&src, out_dir.join(&name))
                    .with_context(|| format!("failed to copy {}", src.display()))?;
                Some(name)
            } else {
                warn!("Favicon {} not found, skipping", src.display());
                None
            }
        }
        None => None,
    };

    let public = |file: &str| format!("{}{}", bc.output.public_path, file);
    let css_refs: Vec<String> = css.iter().map(|c| public(&c.file)).collect();
    let js_refs: Vec<String> = chunks.iter().map(|c| public(&c.file)).collect();

    let html =
        generate_html(template, &css_refs, &js_refs, favicon.as_deref(), bc.html.minify);
    emitter::write_file(out_dir, "index.html", html.as_bytes())?;
    Ok("index.html".to_string())
}
