//! Display formatting utilities for CLI output

use colored::*;

use crate::models::{DocumentContent, SearchHit};

/// Wrap text to fit within a specified width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();

  for paragraph in text.split('\n') {
    if paragraph.trim().is_empty() {
      lines.push(String::new());
      continue;
    }

    let mut current_line = String::new();
    for word in paragraph.split_whitespace() {
      if current_line.is_empty() {
        current_line = word.to_string();
      } else if current_line.chars().count() + 1 + word.chars().count() <= width {
        current_line.push(' ');
        current_line.push_str(word);
      } else {
        lines.push(std::mem::take(&mut current_line));
        current_line = word.to_string();
      }
    }

    if !current_line.is_empty() {
      lines.push(current_line);
    }
  }

  lines
}

/// Plain-text body of a hit: `Q:`/`A:` lines for FAQ entries
pub fn hit_body(hit: &SearchHit) -> String {
  match hit.decode() {
    Ok(DocumentContent::Faq(faq)) => format!("Q: {}\nA: {}", faq.question, faq.answer),
    Ok(DocumentContent::Plain(text)) => text,
    Err(_) => hit.content.clone(),
  }
}

/// Render one ranked hit with its score, id and wrapped body
pub fn format_hit(rank: usize, hit: &SearchHit) -> String {
  let mut out = format!(
    "{} {} {} {}\n",
    format!("{rank}.").bold(),
    format!("[{:.3}]", hit.score).green(),
    hit.kind.as_str().cyan(),
    hit.id.dimmed()
  );
  for line in wrap_text(&hit_body(hit), 80) {
    out.push_str("   ");
    out.push_str(&line);
    out.push('\n');
  }
  out
}
