//! Turns freeform completion text into HTML.
//!
//! Blank lines split paragraphs, single newlines become `<br>`, markdown
//! emphasis and headings are promoted, bullet runs become lists, and known
//! section names become iconed subheadings. The text of every chunk is
//! wrapped in `<p>`; headings and lists are closed out of the paragraph
//! and sit between them.

/// Section names the model tends to emit as plain lines.
const KNOWN_SECTIONS: &[(&str, &str)] = &[
    ("Flight Information", "✈️"),
    ("Accommodation", "🏨"),
    ("Itinerary", "🗓️"),
    ("Day-by-Day Itinerary", "🗓️"),
    ("Activities", "🎯"),
    ("Food & Dining", "🍽️"),
    ("Packing List", "🧳"),
    ("Safety Tips", "🛡️"),
    ("Visa Requirements", "🛂"),
    ("Budget", "💰"),
    ("Local Language", "🗣️"),
    ("Weather", "🌤️"),
    ("Transportation", "🚆"),
    ("Money", "💱"),
    ("Emergency Contacts", "🚨"),
    ("Final Notes", "📝"),
];

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn format_freeform(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    paragraphs(&normalized)
        .iter()
        .map(|chunk| format_chunk(chunk))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Blank-line separated chunks. Whitespace-only lines count as blank.
fn paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

enum Line {
    Text(String),
    Block(String),
    Item(String),
}

fn format_chunk(lines: &[&str]) -> String {
    let mut out = String::new();
    let mut paragraph = String::new();
    let mut items: Vec<String> = Vec::new();

    for line in lines.iter().map(|line| classify(line)) {
        match line {
            Line::Item(item) => {
                close_paragraph(&mut out, &mut paragraph);
                items.push(item);
            }
            Line::Text(html) => {
                flush_list(&mut out, &mut items);
                if !paragraph.is_empty() {
                    paragraph.push_str("<br>");
                }
                paragraph.push_str(&html);
            }
            Line::Block(html) => {
                close_paragraph(&mut out, &mut paragraph);
                flush_list(&mut out, &mut items);
                out.push_str(&html);
            }
        }
    }
    close_paragraph(&mut out, &mut paragraph);
    flush_list(&mut out, &mut items);
    out
}

fn close_paragraph(out: &mut String, paragraph: &mut String) {
    if paragraph.is_empty() {
        return;
    }
    out.push_str("<p>");
    out.push_str(paragraph);
    out.push_str("</p>");
    paragraph.clear();
}

fn flush_list(out: &mut String, items: &mut Vec<String>) {
    if items.is_empty() {
        return;
    }
    out.push_str("<ul>");
    for item in items.drain(..) {
        out.push_str("<li>");
        out.push_str(&item);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

fn classify(line: &str) -> Line {
    let trimmed = line.trim();

    if let Some((name, icon)) = known_section(trimmed) {
        return Line::Block(format!(
            "<h3 class=\"section-heading\"><span class=\"icon\">{}</span> {}</h3>",
            icon,
            escape_html(name)
        ));
    }

    for (marker, tag) in [("### ", "h4"), ("## ", "h3"), ("# ", "h2")] {
        if let Some(heading) = trimmed.strip_prefix(marker) {
            return Line::Block(format!("<{tag}>{}</{tag}>", inline(heading.trim())));
        }
    }

    for marker in ["- ", "* ", "• ", "•"] {
        if let Some(item) = trimmed.strip_prefix(marker) {
            return Line::Item(inline(item.trim()));
        }
    }

    Line::Text(inline(trimmed))
}

/// Matches lines like `Flight Information`, `**Budget:**` or `Weather:`.
fn known_section(line: &str) -> Option<(&'static str, &'static str)> {
    let bare = line
        .trim_start_matches('#')
        .trim()
        .trim_matches('*')
        .trim()
        .trim_end_matches(':')
        .trim_matches('*')
        .trim();
    KNOWN_SECTIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(bare))
        .copied()
}

fn inline(text: &str) -> String {
    let escaped = escape_html(text);
    let bold = replace_pairs(&escaped, "**", "<strong>", "</strong>");
    replace_pairs(&bold, "*", "<em>", "</em>")
}

/// Replace `marker`…`marker` pairs whose content neither starts nor ends
/// with whitespace. Anything else is left as written.
fn replace_pairs(text: &str, marker: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(marker) {
        let after = &rest[start + marker.len()..];
        let opens = after
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace() && !marker.starts_with(c));
        if opens {
            if let Some(end) = closing(after, marker) {
                out.push_str(&rest[..start]);
                out.push_str(open);
                out.push_str(&after[..end]);
                out.push_str(close);
                rest = &after[end + marker.len()..];
                continue;
            }
        }
        out.push_str(&rest[..start + marker.len()]);
        rest = after;
    }
    out.push_str(rest);
    out
}

fn closing(text: &str, marker: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = text[from..].find(marker) {
        let idx = from + i;
        if idx > 0 && !text[..idx].ends_with(char::is_whitespace) {
            return Some(idx);
        }
        from = idx + marker.len();
    }
    None
}
