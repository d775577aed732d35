//! Print and plain-text exports of the cached brief HTML.

const PRINT_STYLE: &str = r#"<style media="print">
@page { margin: 16mm; }
* { -webkit-print-color-adjust: exact; print-color-adjust: exact; }
body { background: #ffffff; }
.brief { max-width: none; }
.brief-section, .day-block, .trip-summary { page-break-inside: avoid; break-inside: avoid; }
.section-title { page-break-after: avoid; break-after: avoid; }
.brief-footer { page-break-before: avoid; }
</style>"#;

const PRINT_SCRIPT: &str = r#"<script>window.addEventListener("load", function () { setTimeout(function () { window.print(); }, 300); });</script>"#;

pub const TEXT_FILE_NAME: &str = "travel-brief.txt";

/// Copy of the brief with print rules and an auto-print script injected.
/// An empty input still yields a printable (blank) page.
pub fn print_document(html: &str) -> String {
    let mut doc = html.to_string();

    match doc.find("</head>") {
        Some(at) => doc.insert_str(at, PRINT_STYLE),
        None => doc.insert_str(0, PRINT_STYLE),
    }
    match doc.rfind("</body>") {
        Some(at) => doc.insert_str(at, PRINT_SCRIPT),
        None => doc.push_str(PRINT_SCRIPT),
    }
    doc
}

/// Strip markup for the text download. Block ends become line breaks, runs
/// of spaces collapse, and blank lines shrink to one.
pub fn plain_text(html: &str) -> String {
    let without_code = ["style", "script", "title"]
        .iter()
        .fold(html.to_string(), |doc, name| drop_element(&doc, name));

    let mut text = String::with_capacity(without_code.len());
    let mut rest = without_code.as_str();
    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            rest = "";
            break;
        };
        let tag = rest[open + 1..open + close].trim().to_ascii_lowercase();
        if is_line_break(&tag) {
            text.push('\n');
        }
        rest = &rest[open + close + 1..];
    }
    text.push_str(rest);

    collapse_whitespace(&decode_entities(&text))
}

/// Closing block tags and `<br>` end a line.
fn is_line_break(tag: &str) -> bool {
    let closing = tag.starts_with('/');
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("");
    if !closing {
        return matches!(name, "br" | "hr");
    }
    matches!(
        name,
        "p" | "div" | "li" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "section" | "header" | "footer" | "tr" | "dt" | "dd"
    )
}

/// Remove `<name ...>...</name>` blocks including their content.
fn drop_element(html: &str, name: &str) -> String {
    let open_tag = format!("<{}", name);
    let close_tag = format!("</{}>", name);
    let lower = html.to_ascii_lowercase();

    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    while let Some(start) = lower[cursor..].find(&open_tag).map(|i| cursor + i) {
        out.push_str(&html[cursor..start]);
        cursor = match lower[start..].find(&close_tag) {
            Some(end) => start + end + close_tag.len(),
            None => html.len(),
        };
    }
    out.push_str(&html[cursor..]);
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&copy;", "©")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut blank = false;
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            if !lines.is_empty() {
                blank = true;
            }
            continue;
        }
        if blank {
            lines.push(String::new());
            blank = false;
        }
        lines.push(line);
    }
    lines.join("\n")
}
