#[derive(Debug, Clone)]
pub struct EmittedChunk {
    pub name: String,
    /// Output-relative path of the written bundle
    pub file: String,
    pub bytes: u64,
    pub modules: usize,
}

#[derive(Debug, Clone)]
pub enum AssetOutput {
    /// Encoded into the referencing bundle, no file written
    Inlined { bytes: u64 },
    File { path: String, bytes: u64 },
}

#[derive(Debug, Clone)]
pub struct EmittedAsset {
    /// Root-relative source path
    pub source: String,
    pub output: AssetOutput,
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub chunks: Vec<EmittedChunk>,
    pub css: Vec<EmittedChunk>,
    pub assets: Vec<EmittedAsset>,
    /// Output-relative path of the generated entry document
    pub html: Option<String>,
    pub copied_files: usize,
    pub files_analyzed: usize,
}
