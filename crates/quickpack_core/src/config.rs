use anyhow::{Context, Result, anyhow, bail};
use log::{debug, trace};
use serde::Deserialize;
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::constants::RESOLVE_EXTENSIONS;

/// Name of the configuration file looked up under the project root.
pub const CONFIG_FILE: &str = "quickpack.config.json";

/// Build mode. Production appends the minify pass to every transformer
/// chain and enables HTML minification defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    pub fn is_production(self) -> bool {
        self == Mode::Production
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development" => Ok(Mode::Development),
            "production" => Ok(Mode::Production),
            other => Err(anyhow!(
                "unrecognized mode '{}', expected 'development' or 'production'",
                other
            )),
        }
    }
}

/// Capability tag of a transformer. The chain runner dispatches on the tag,
/// never on the transformer name, so new transformers can be declared in
/// configuration without code changes elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformTag {
    Lint,
    Compile,
    Style,
    Minify,
}

/// One step of a transformer chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformerDesc {
    pub name: String,
    pub tag: TransformTag,
    /// Lint steps with `fix` enabled rewrite fixable violations in place
    #[serde(default)]
    pub fix: bool,
    /// Path fragment; files whose project-relative path contains it skip
    /// this step (e.g. `node_modules`)
    #[serde(default)]
    pub exclude: Option<String>,
}

/// Maps file extensions to an ordered transformer chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    /// Extensions this rule applies to
    pub test: Vec<String>,
    #[serde(rename = "use")]
    pub chain: Vec<TransformerDesc>,
    /// Higher precedence wins when several rules match; ties are broken by
    /// declaration order
    #[serde(default)]
    pub precedence: i32,
}

/// Membership rule for a named output bundle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheGroup {
    pub name: String,
    /// Path fragment the module's path must contain
    #[serde(default)]
    pub test: Option<String>,
    /// Minimum number of distinct importers
    #[serde(default = "default_min_chunks")]
    pub min_chunks: usize,
    /// Minimum module size in bytes
    #[serde(default)]
    pub min_size: u64,
    /// Higher priority is evaluated first; ties are broken by declaration
    /// order
    #[serde(default)]
    pub priority: i32,
}

fn default_min_chunks() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    /// Output directory, relative to the project root
    pub path: String,
    /// Prefix prepended to every public URL the build emits
    pub public_path: String,
    /// Filename template for JS bundles
    pub filename: String,
    /// Filename template for extracted CSS
    pub css_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            path: "dist".to_string(),
            public_path: String::new(),
            filename: "js/[name].[chunkhash].js".to_string(),
            css_filename: "css/[name].[hash].css".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolveConfig {
    /// Extension search order for extensionless requests
    pub extensions: Vec<String>,
    /// Directories (relative to the root) probed for bare requests before
    /// the node_modules walk-up
    pub modules: Vec<String>,
    /// Alias table; keys ending in `$` match the whole request, other keys
    /// match as prefixes. Values are fallback targets tried in order.
    pub alias: HashMap<String, Vec<String>>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        ResolveConfig {
            extensions: RESOLVE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            modules: vec!["src".to_string(), "node_modules".to_string()],
            alias: HashMap::from([(
                "vue$".to_string(),
                vec!["node_modules/vue/dist/vue.esm.js".to_string()],
            )]),
        }
    }
}

impl ResolveConfig {
    /// Normalize the extension list: trim entries, strip a leading dot and
    /// drop what is left empty. Configs written by hand routinely carry a
    /// stray `" "` or a `.js` with the dot included.
    pub fn normalize(&mut self) {
        let mut cleaned = Vec::with_capacity(self.extensions.len());
        for raw in &self.extensions {
            let ext = raw.trim().trim_start_matches('.');
            if ext.is_empty() {
                debug!("Dropping empty resolve extension entry {:?}", raw);
                continue;
            }
            cleaned.push(ext.to_string());
        }
        self.extensions = cleaned;
    }
}

/// Per-category inline thresholds in bytes. Assets strictly smaller than
/// the threshold are inlined as data URIs; everything else is emitted as a
/// hashed file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssetLimits {
    pub images: u64,
    pub fonts: u64,
    pub audios: u64,
    pub videos: u64,
}

impl Default for AssetLimits {
    fn default() -> Self {
        AssetLimits { images: 10 * 1024, fonts: 8192, audios: 8192, videos: 8192 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HtmlConfig {
    /// Template file, relative to the root. A built-in scaffold is used
    /// when the file is absent.
    pub template: String,
    pub favicon: Option<String>,
    /// Strip comments and collapse inter-tag whitespace in the generated
    /// document
    pub minify: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        HtmlConfig {
            template: "index.html".to_string(),
            favicon: Some("favicon.ico".to_string()),
            minify: true,
        }
    }
}

/// A file or directory copied verbatim into the output tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyEntry {
    pub from: String,
    pub to: String,
}

/// The immutable build configuration. Constructed once at startup and
/// passed explicitly to every stage; nothing mutates it during a run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfig {
    pub mode: Mode,
    /// Entry script, relative to the project root
    pub entry: String,
    pub output: OutputConfig,
    /// Source-map flavor; any non-empty value enables per-bundle maps
    pub devtool: Option<String>,
    pub resolve: ResolveConfig,
    pub assets: AssetLimits,
    pub split_chunks: Vec<CacheGroup>,
    pub html: HtmlConfig,
    pub copy: Vec<CopyEntry>,
    pub rules: Vec<RuleConfig>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            mode: Mode::Production,
            entry: "src/main.js".to_string(),
            output: OutputConfig::default(),
            devtool: Some("cheap-module-source-map".to_string()),
            resolve: ResolveConfig::default(),
            assets: AssetLimits::default(),
            split_chunks: default_split_chunks(),
            html: HtmlConfig::default(),
            copy: vec![
                CopyEntry { from: "static".to_string(), to: "static".to_string() },
                CopyEntry { from: "README.md".to_string(), to: "README".to_string() },
            ],
            rules: default_rules(),
        }
    }
}

fn default_split_chunks() -> Vec<CacheGroup> {
    vec![
        CacheGroup {
            name: "vendor".to_string(),
            test: Some("node_modules".to_string()),
            min_chunks: 1,
            min_size: 0,
            priority: 10,
        },
        CacheGroup {
            name: "utils".to_string(),
            test: None,
            min_chunks: 2,
            min_size: 0,
            priority: 0,
        },
    ]
}

fn default_rules() -> Vec<RuleConfig> {
    let lint = |exclude: Option<&str>| TransformerDesc {
        name: "eslint".to_string(),
        tag: TransformTag::Lint,
        fix: true,
        exclude: exclude.map(|e| e.to_string()),
    };
    let compile = |name: &str, exclude: Option<&str>| TransformerDesc {
        name: name.to_string(),
        tag: TransformTag::Compile,
        fix: false,
        exclude: exclude.map(|e| e.to_string()),
    };
    let style = |name: &str| TransformerDesc {
        name: name.to_string(),
        tag: TransformTag::Style,
        fix: false,
        exclude: None,
    };
    vec![
        RuleConfig {
            test: vec!["vue".to_string()],
            chain: vec![lint(None), compile("vue", None)],
            precedence: 10,
        },
        RuleConfig {
            test: vec!["js".to_string(), "mjs".to_string(), "jsx".to_string()],
            chain: vec![
                lint(Some("node_modules")),
                compile("babel", Some("node_modules")),
            ],
            precedence: 0,
        },
        RuleConfig {
            test: vec!["json".to_string()],
            chain: vec![compile("json", None)],
            precedence: 0,
        },
        RuleConfig {
            test: vec!["css".to_string(), "less".to_string()],
            chain: vec![style("extract"), style("css"), style("postcss"), style("less")],
            precedence: 0,
        },
    ]
}

impl BuildConfig {
    /// Reject configurations the pipeline cannot run with. Called once at
    /// load time; the build aborts on the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.entry.trim().is_empty() {
            bail!("configuration error: 'entry' must not be empty");
        }
        if self.output.path.trim().is_empty() {
            bail!("configuration error: 'output.path' must not be empty");
        }
        if self.output.filename.trim().is_empty() || self.output.css_filename.trim().is_empty() {
            bail!("configuration error: output filename templates must not be empty");
        }
        for rule in &self.rules {
            if rule.test.is_empty() {
                bail!("configuration error: a rule declares no extensions to match");
            }
            if rule.chain.is_empty() {
                bail!(
                    "configuration error: rule for {:?} declares an empty transformer chain",
                    rule.test
                );
            }
            // Lint runs as a pre-pass; a chain that puts it after another
            // stage would lint already-transformed output
            let mut past_lint = false;
            for step in &rule.chain {
                match step.tag {
                    TransformTag::Lint if past_lint => bail!(
                        "configuration error: rule for {:?} places lint step '{}' after a \
                         non-lint step",
                        rule.test,
                        step.name
                    ),
                    TransformTag::Lint => {}
                    _ => past_lint = true,
                }
            }
        }
        let mut seen = Vec::new();
        for group in &self.split_chunks {
            if group.name.trim().is_empty() {
                bail!("configuration error: a split-chunks group has an empty name");
            }
            if seen.contains(&group.name.as_str()) {
                bail!("configuration error: duplicate split-chunks group '{}'", group.name);
            }
            seen.push(group.name.as_str());
        }
        Ok(())
    }
}

/// Load the build configuration. A missing default config file yields the
/// built-in defaults; an explicitly requested file that is absent is an
/// error.
pub fn load_build_config(root: &Path, file: Option<&Path>) -> Result<BuildConfig> {
    let (path, explicit) = match file {
        Some(f) => (root.join(f), true),
        None => (root.join(CONFIG_FILE), false),
    };

    let mut cfg = if path.is_file() {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        // Strip // comments (simple approach - removes // comments)
        let content_no_comments: String = content
            .lines()
            .map(|line| if let Some(idx) = line.find("//") { &line[..idx] } else { line })
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str::<BuildConfig>(&content_no_comments)
            .with_context(|| format!("failed to parse {}", path.display()))?
    } else if explicit {
        return Err(anyhow!("configuration file {} does not exist", path.display()));
    } else {
        debug!("No {} under {}, using defaults", CONFIG_FILE, root.display());
        BuildConfig::default()
    };

    cfg.resolve.normalize();
    cfg.validate()?;
    trace!("Loaded configuration: {:?}", cfg);
    Ok(cfg)
}

/// Locate the project root by walking up from the current directory until a
/// configuration file or a `.git` directory is found.
pub fn find_project_root() -> Result<PathBuf> {
    debug!("Searching for project root");
    let current_dir = env::current_dir()?;
    find_root_from(&current_dir)
        .ok_or_else(|| anyhow!("could not find {} or a .git directory in any parent folder", CONFIG_FILE))
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        trace!("Checking for project markers at: {:?}", current);
        if current.join(CONFIG_FILE).is_file() || current.join(".git").exists() {
            debug!("Found project root at: {:?}", current);
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}
