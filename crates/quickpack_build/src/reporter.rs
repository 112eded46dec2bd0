use std::io::{self, Write};

use colored::Colorize;
use log::debug;

use crate::types::{AssetOutput, BuildResult};

/// Render the build summary: every emitted file with its size, then the
/// inline/copy counters.
pub fn print_build_report<W: Write>(writer: &mut W, result: &BuildResult) -> io::Result<()> {
    debug!("Printing build report");

    writeln!(writer, "{} Build complete\n", "✓".green().bold())?;

    let total = result.chunks.len() + result.css.len();
    for (idx, chunk) in result.chunks.iter().chain(result.css.iter()).enumerate() {
        let prefix = if idx == total - 1 && result.assets.is_empty() && result.html.is_none() {
            "└──"
        } else {
            "├──"
        };
        writeln!(
            writer,
            "{}  {} ({}, {} modules)",
            prefix.dimmed(),
            chunk.file.blue(),
            fmt_bytes(chunk.bytes).cyan(),
            chunk.modules
        )?;
    }

    for asset in &result.assets {
        if let AssetOutput::File { path, bytes } = &asset.output {
            writeln!(
                writer,
                "{}  {} ({})",
                "├──".dimmed(),
                path.blue(),
                fmt_bytes(*bytes).cyan()
            )?;
        }
    }

    if let Some(html) = &result.html {
        writeln!(writer, "{}  {}", "└──".dimmed(), html.blue())?;
    }

    let inlined = result
        .assets
        .iter()
        .filter(|a| matches!(a.output, AssetOutput::Inlined { .. }))
        .count();

    writeln!(writer)?;
    writeln!(writer, "{}", "Summary".bold())?;
    writeln!(writer, "  Bundles emitted: {}", result.chunks.len().to_string().cyan())?;
    writeln!(writer, "  Css files: {}", result.css.len().to_string().cyan())?;
    writeln!(writer, "  Assets inlined: {}", inlined.to_string().yellow())?;
    writeln!(
        writer,
        "  Assets emitted: {}",
        (result.assets.len() - inlined).to_string().cyan()
    )?;
    writeln!(writer, "  Static files copied: {}", result.copied_files.to_string().cyan())?;

    writer.flush()?;
    Ok(())
}

fn fmt_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
