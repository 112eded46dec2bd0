use log::trace;

/// Generate the entry document: inject stylesheet links and script tags for
/// the emitted bundles into the template (or a built-in scaffold), with the
/// favicon referenced when one was copied.
///
/// Scripts are injected in the order given, which the driver arranges as
/// split bundles first and the entry bundle last.
pub(crate) fn generate_html(
    template: Option<String>,
    css: &[String],
    js: &[String],
    favicon: Option<&str>,
    minify: bool,
) -> String {
    let base = template.unwrap_or_else(default_template);

    let mut head_inserts = String::new();
    if let Some(favicon) = favicon {
        head_inserts.push_str(&format!("<link rel=\"icon\" href=\"{}\">\n", favicon));
    }
    for href in css {
        head_inserts.push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">\n", href));
    }

    let mut body_inserts = String::new();
    for src in js {
        body_inserts.push_str(&format!("<script src=\"{}\"></script>\n", src));
    }

    let with_head = insert_before(&base, "</head>", &head_inserts);
    let mut html = insert_before(&with_head, "</body>", &body_inserts);

    if minify {
        trace!("Minifying generated HTML");
        html = minify_html(&html);
    }
    html
}

fn default_template() -> String {
    concat!(
        "<!DOCTYPE html>\n",
        "<html>\n",
        "<head>\n",
        "<meta charset=\"utf-8\">\n",
        "<title>quickpack app</title>\n",
        "</head>\n",
        "<body>\n",
        "<div id=\"app\"></div>\n",
        "</body>\n",
        "</html>\n",
    )
    .to_string()
}

/// Insert `content` before the first occurrence of `marker`, or append when
/// the template does not carry the marker.
fn insert_before(html: &str, marker: &str, content: &str) -> String {
    if content.is_empty() {
        return html.to_string();
    }
    match html.find(marker) {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + content.len());
            out.push_str(&html[..idx]);
            out.push_str(content);
            out.push_str(&html[idx..]);
            out
        }
        None => {
            let mut out = html.to_string();
            out.push_str(content);
            out
        }
    }
}

/// Strip `<!-- -->` comments and collapse whitespace; runs of whitespace
/// between a closing `>` and an opening `<` are dropped entirely.
fn minify_html(html: &str) -> String {
    let mut without_comments = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find("<!--") {
        without_comments.push_str(&rest[..start]);
        match rest[start + 4..].find("-->") {
            Some(end) => rest = &rest[start + 4 + end + 3..],
            None => {
                rest = "";
                break;
            }
        }
    }
    without_comments.push_str(rest);

    let mut out = String::with_capacity(without_comments.len());
    let mut pending_ws = false;
    for ch in without_comments.chars() {
        if ch.is_whitespace() {
            pending_ws = true;
            continue;
        }
        if pending_ws {
            if !(out.ends_with('>') && ch == '<') && !out.is_empty() {
                out.push(' ');
            }
            pending_ws = false;
        }
        out.push(ch);
    }
    out
}
