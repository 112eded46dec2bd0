use anyhow::{Context, Result};
use log::{debug, trace};
use std::{fs, path::Path};

use quickpack_assets::{content_hash, render_template};
use quickpack_core::OutputConfig;

use crate::types::EmittedChunk;

/// Remove the previous output tree and recreate the directory, so every
/// build starts from a clean slate.
pub(crate) fn clean_output(out_dir: &Path) -> Result<()> {
    if out_dir.exists() {
        fs::remove_dir_all(out_dir)
            .with_context(|| format!("failed to clean {}", out_dir.display()))?;
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    debug!("Cleaned output directory {}", out_dir.display());
    Ok(())
}

/// Write a JS bundle under its hashed name. When a source-map flavor is
/// configured, a sibling `.map` (version 3, sources only) is written and
/// referenced from the bundle's last line.
pub(crate) fn write_js_chunk(
    out_dir: &Path,
    output: &OutputConfig,
    devtool: Option<&str>,
    name: &str,
    mut body: String,
    sources: &[String],
) -> Result<EmittedChunk> {
    let hash = content_hash(body.as_bytes());
    let file = render_template(&output.filename, name, &hash, "js");

    if devtool.is_some() {
        let map_name = format!(
            "{}.map",
            Path::new(&file).file_name().map(|f| f.to_string_lossy()).unwrap_or_default()
        );
        let map = serde_json::json!({
            "version": 3,
            "file": Path::new(&file).file_name().map(|f| f.to_string_lossy()).unwrap_or_default(),
            "sources": sources,
            "names": [],
            "mappings": "",
        });
        body.push_str(&format!("//# sourceMappingURL={}\n", map_name));
        write_file(out_dir, &format!("{}.map", file), map.to_string().as_bytes())?;
    }

    let bytes = body.len() as u64;
    write_file(out_dir, &file, body.as_bytes())?;
    Ok(EmittedChunk { name: name.to_string(), file, bytes, modules: sources.len() })
}

/// Write the extracted CSS of a bundle under its hashed name.
pub(crate) fn write_css_chunk(
    out_dir: &Path,
    output: &OutputConfig,
    name: &str,
    body: String,
    sources: &[String],
) -> Result<EmittedChunk> {
    let hash = content_hash(body.as_bytes());
    let file = render_template(&output.css_filename, name, &hash, "css");
    let bytes = body.len() as u64;
    write_file(out_dir, &file, body.as_bytes())?;
    Ok(EmittedChunk { name: name.to_string(), file, bytes, modules: sources.len() })
}

pub(crate) fn write_file(out_dir: &Path, rel: &str, bytes: &[u8]) -> Result<()> {
    let path = out_dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    trace!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_output_removes_previous_tree() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("dist");
        fs::create_dir_all(out.join("js")).unwrap();
        fs::write(out.join("js/stale.js"), "old").unwrap();

        clean_output(&out).unwrap();
        assert!(out.is_dir());
        assert!(!out.join("js/stale.js").exists());
    }

    #[test]
    fn test_write_js_chunk_hashed_name() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path();
        let output = OutputConfig::default();
        let body = "var a = 1;\n".to_string();
        let hash = content_hash(body.as_bytes());

        let chunk =
            write_js_chunk(out, &output, None, "main", body, &["src/main.js".to_string()])
                .unwrap();
        assert_eq!(chunk.file, format!("js/main.{}.js", hash));
        assert!(out.join(&chunk.file).is_file());
        assert_eq!(chunk.modules, 1);
    }

    #[test]
    fn test_write_js_chunk_with_source_map() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path();
        let output = OutputConfig::default();

        let chunk = write_js_chunk(
            out,
            &output,
            Some("cheap-module-source-map"),
            "main",
            "var a = 1;\n".to_string(),
            &["src/main.js".to_string()],
        )
        .unwrap();

        let written = fs::read_to_string(out.join(&chunk.file)).unwrap();
        assert!(written.contains("sourceMappingURL="));

        let map_path = out.join(format!("{}.map", chunk.file));
        let map: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(map_path).unwrap()).unwrap();
        assert_eq!(map["version"], 3);
        assert_eq!(map["sources"][0], "src/main.js");
    }

    #[test]
    fn test_write_css_chunk() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path();
        let output = OutputConfig::default();
        let body = "body { margin: 0; }\n".to_string();
        let hash = content_hash(body.as_bytes());

        let chunk =
            write_css_chunk(out, &output, "main", body, &["src/app.css".to_string()]).unwrap();
        assert_eq!(chunk.file, format!("css/main.{}.css", hash));
        assert!(out.join(&chunk.file).is_file());
    }

    #[test]
    fn test_identical_input_identical_names() {
        let temp_a = TempDir::new().unwrap();
        let temp_b = TempDir::new().unwrap();
        let output = OutputConfig::default();

        let a = write_js_chunk(temp_a.path(), &output, None, "main", "var x;\n".to_string(), &[])
            .unwrap();
        let b = write_js_chunk(temp_b.path(), &output, None, "main", "var x;\n".to_string(), &[])
            .unwrap();
        assert_eq!(a.file, b.file);
    }
}
