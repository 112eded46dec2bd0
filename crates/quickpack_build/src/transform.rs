use anyhow::{Result, anyhow};
use log::trace;
use std::path::Path;

use quickpack_core::{RuleConfig, TransformTag, TransformerDesc, script_block, syntax_errors};

/// Find the transformer rule for a file: highest precedence first, ties by
/// declaration order, first rule whose extension list matches.
pub(crate) fn rule_for<'a>(rules: &'a [RuleConfig], path: &Path) -> Option<&'a RuleConfig> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    let mut ordered: Vec<&RuleConfig> = rules.iter().collect();
    ordered.sort_by_key(|r| std::cmp::Reverse(r.precedence));
    ordered.into_iter().find(|r| r.test.iter().any(|t| t == ext))
}

/// Run a module through its transformer chain in declared order. Lint
/// steps run first (validated at config load), auto-fixing what they can
/// and aborting on what they cannot; compile and style steps follow. In
/// production the minify pass runs terminally, the way a minimizer hangs
/// off the end of every chain.
pub(crate) fn apply_chain(
    rel: &str,
    path: &Path,
    source: String,
    rule: &RuleConfig,
    minify: bool,
) -> Result<String> {
    let mut out = source;
    for step in &rule.chain {
        if excluded(step, rel) {
            trace!("Skipping '{}' for excluded path {}", step.name, rel);
            continue;
        }
        trace!("Applying '{}' to {}", step.name, rel);
        out = apply_step(rel, path, out, step)?;
    }
    if minify {
        out = strip_comments(&out);
    }
    Ok(out)
}

fn excluded(step: &TransformerDesc, rel: &str) -> bool {
    step.exclude.as_ref().is_some_and(|fragment| rel.contains(fragment.as_str()))
}

fn apply_step(rel: &str, path: &Path, source: String, step: &TransformerDesc) -> Result<String> {
    match step.tag {
        TransformTag::Lint => lint(rel, path, source, step),
        TransformTag::Compile => Ok(compile(path, source)),
        // Style steps stand in for the real preprocessor chain; the
        // sources pass through and are extracted per-bundle later
        TransformTag::Style => Ok(source),
        TransformTag::Minify => Ok(strip_comments(&source)),
    }
}

/// The lint pre-pass. Whitespace-class violations (trailing whitespace,
/// missing final newline) are fixable and rewritten in place when `fix` is
/// enabled; syntax errors are unfixable and abort the build, naming the
/// file and the transformer.
fn lint(rel: &str, path: &Path, source: String, step: &TransformerDesc) -> Result<String> {
    let fixed = if step.fix { autofix(&source) } else { source };

    let ext = path.extension().and_then(|e| e.to_str());
    if matches!(ext, Some("js") | Some("jsx") | Some("mjs") | Some("vue")) {
        let errors = syntax_errors(path, &fixed);
        if let Some(first) = errors.first() {
            return Err(anyhow!(
                "{}: '{}' found {} unfixable problem(s): {}",
                rel,
                step.name,
                errors.len(),
                first
            ));
        }
    }
    Ok(fixed)
}

fn autofix(source: &str) -> String {
    let mut out: String =
        source.lines().map(str::trim_end).collect::<Vec<_>>().join("\n");
    out.push('\n');
    out
}

/// Compile stand-in. Single-file components contribute their script block;
/// everything else passes through. A real transpiler plugs in behind the
/// same tag.
fn compile(path: &Path, source: String) -> String {
    if path.extension().and_then(|e| e.to_str()) == Some("vue") {
        let mut block = script_block(&source).unwrap_or("").trim().to_string();
        block.push('\n');
        return block;
    }
    source
}

/// Minify stand-in: drop block comments, line comments and blank lines.
pub(crate) fn strip_comments(source: &str) -> String {
    let mut without_blocks = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("/*") {
        without_blocks.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    without_blocks.push_str(rest);

    let mut out: String = without_blocks
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim_start().starts_with("//") && !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickpack_core::BuildConfig;
    use std::path::PathBuf;

    fn default_rules() -> Vec<RuleConfig> {
        BuildConfig::default().rules
    }

    #[test]
    fn test_rule_for_matches_by_extension() {
        let rules = default_rules();
        let rule = rule_for(&rules, Path::new("src/main.js")).unwrap();
        assert!(rule.test.contains(&"js".to_string()));
        let rule = rule_for(&rules, Path::new("src/App.vue")).unwrap();
        assert!(rule.test.contains(&"vue".to_string()));
        assert!(rule_for(&rules, Path::new("logo.png")).is_none());
        assert!(rule_for(&rules, Path::new("Makefile")).is_none());
    }

    #[test]
    fn test_rule_for_precedence_and_declaration_order() {
        let mut rules = default_rules();
        // A later rule with higher precedence shadows the stock js rule
        rules.push(RuleConfig {
            test: vec!["js".to_string()],
            chain: vec![TransformerDesc {
                name: "custom".to_string(),
                tag: TransformTag::Compile,
                fix: false,
                exclude: None,
            }],
            precedence: 50,
        });
        let rule = rule_for(&rules, Path::new("a.js")).unwrap();
        assert_eq!(rule.chain[0].name, "custom");
    }

    #[test]
    fn test_autofix_trailing_whitespace_and_final_newline() {
        let fixed = autofix("const a = 1;   \nconst b = 2;\t");
        assert_eq!(fixed, "const a = 1;\nconst b = 2;\n");
    }

    #[test]
    fn test_lint_fixable_violation_succeeds() {
        let rules = default_rules();
        let rule = rule_for(&rules, Path::new("src/a.js")).unwrap();
        let out =
            apply_chain("src/a.js", Path::new("src/a.js"), "const a = 1;  ".to_string(), rule, false)
                .unwrap();
        assert_eq!(out, "const a = 1;\n");
    }

    #[test]
    fn test_lint_unfixable_violation_aborts() {
        let rules = default_rules();
        let rule = rule_for(&rules, Path::new("src/a.js")).unwrap();
        let err = apply_chain(
            "src/a.js",
            Path::new("src/a.js"),
            "function (]{".to_string(),
            rule,
            false,
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("src/a.js"), "error should name the file: {}", err);
        assert!(err.contains("eslint"), "error should name the transformer: {}", err);
    }

    #[test]
    fn test_excluded_path_skips_lint() {
        let rules = default_rules();
        let rule = rule_for(&rules, Path::new("x.js")).unwrap();
        // Broken source under node_modules passes straight through
        let rel = "node_modules/dep/index.js";
        let out = apply_chain(
            rel,
            Path::new(rel),
            "function (]{".to_string(),
            rule,
            false,
        )
        .unwrap();
        assert_eq!(out, "function (]{");
    }

    #[test]
    fn test_vue_compile_extracts_script_block() {
        let rules = default_rules();
        let path = PathBuf::from("src/App.vue");
        let rule = rule_for(&rules, &path).unwrap();
        let src = "<template><div/></template>\n<script>\nexport default {};\n</script>\n";
        let out = apply_chain("src/App.vue", &path, src.to_string(), rule, false).unwrap();
        assert_eq!(out, "export default {};\n");
    }

    #[test]
    fn test_minify_strips_comments_and_blank_lines() {
        let src = "// header\nconst a = 1; /* inline */\n\nconst b = 2;\n";
        assert_eq!(strip_comments(src), "const a = 1;\nconst b = 2;\n");
    }

    #[test]
    fn test_production_chain_minifies() {
        let rules = default_rules();
        let rule = rule_for(&rules, Path::new("src/a.js")).unwrap();
        let out = apply_chain(
            "src/a.js",
            Path::new("src/a.js"),
            "// note\nconst a = 1;\n".to_string(),
            rule,
            true,
        )
        .unwrap();
        assert_eq!(out, "const a = 1;\n");
    }
}
