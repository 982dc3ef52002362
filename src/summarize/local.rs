// src/summarize/local.rs
use once_cell::sync::OnceCell;
use regex::Regex;

const MAX_SENTENCES: usize = 3;

/// Extractive summary: first three sentences of title + text as `- ` bullets.
///
/// Returns the title alone when no terminated sentence is found.
pub fn local_summary(title: &str, text: &str) -> String {
    static RE_SENTENCE: OnceCell<Regex> = OnceCell::new();
    let re = RE_SENTENCE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]+").unwrap());

    let combined = combine(title.trim(), text.trim());
    let bullets: Vec<String> = re
        .find_iter(&combined)
        .map(|m| collapse_ws(m.as_str()))
        .filter(|s| !s.is_empty())
        .take(MAX_SENTENCES)
        .map(|s| format!("- {s}"))
        .collect();

    if bullets.is_empty() {
        title.trim().to_string()
    } else {
        bullets.join("\n")
    }
}

fn combine(title: &str, text: &str) -> String {
    match (title.is_empty(), text.is_empty()) {
        (true, _) => text.to_string(),
        (false, true) => title.to_string(),
        (false, false) => {
            // Terminate the title so it counts as its own sentence.
            if title.ends_with(['.', '!', '?']) {
                format!("{title} {text}")
            } else {
                format!("{title}. {text}")
            }
        }
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
