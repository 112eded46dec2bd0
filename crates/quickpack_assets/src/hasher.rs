use sha2::{Digest, Sha256};

/// SHA-256 of the content as lowercase hex. Two builds of identical input
/// produce identical names, so cached URLs invalidate exactly on change.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Render a filename template. Supported tokens: `[name]`, `[ext]`,
/// `[hash]` and `[chunkhash]`, each with an optional `:len` truncation
/// (`[hash:8]`). Unknown tokens are left as-is.
pub fn render_template(template: &str, name: &str, hash: &str, ext: &str) -> String {
    let mut out = String::with_capacity(template.len() + hash.len());
    let mut rest = template;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find(']') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let token = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        let (key, len) = match token.split_once(':') {
            Some((key, len)) => (key, len.parse::<usize>().ok()),
            None => (token, None),
        };
        let value = match key {
            "name" => name,
            "ext" => ext,
            "hash" | "chunkhash" => hash,
            _ => {
                out.push('[');
                out.push_str(token);
                out.push(']');
                continue;
            }
        };
        match len {
            Some(n) => out.push_str(&value[..n.min(value.len())]),
            None => out.push_str(value),
        }
    }
    out.push_str(rest);
    out
}
