use crate::models::Item;

/// One Markdown list line per item: `* [name label](url) - YYYY-MM-DD`.
pub fn render(items: &[Item]) -> String {
    items.iter().map(render_line).collect::<Vec<_>>().join("\n")
}

fn render_line(item: &Item) -> String {
    let text = match &item.label {
        Some(label) => format!("{} {}", escape_markdown(&item.name), escape_markdown(label)),
        None => escape_markdown(&item.name),
    };
    format!(
        "* [{}]({}) - {}",
        text,
        escape_url(&item.url),
        item.date.format("%Y-%m-%d")
    )
}

/// Percent-encode the characters that would end or split a link target.
fn escape_url(url: &str) -> String {
    let mut escaped = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            ' ' => escaped.push_str("%20"),
            '(' => escaped.push_str("%28"),
            ')' => escaped.push_str("%29"),
            '<' => escaped.push_str("%3C"),
            '>' => escaped.push_str("%3E"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Escape the characters that would break or restyle link text.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '_' | '[' | ']' | '*') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
