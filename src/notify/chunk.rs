// src/notify/chunk.rs

/// Telegram's hard limit is 4096; stay below it.
pub const DEFAULT_MAX_CHARS: usize = 4000;

const BLOCK_SEP: &str = "\n\n";

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Blocks (separated by a blank line) are packed greedily and never divided, so
/// `chunks.join("\n\n") == text`. The one exception is a single block longer than
/// `max_chars`, which is cut at character boundaries.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    let mut has_current = false;

    for block in text.split(BLOCK_SEP) {
        let block_len = block.chars().count();

        if block_len > max_chars {
            if has_current {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
                has_current = false;
            }
            chunks.extend(hard_split(block, max_chars));
            continue;
        }

        if !has_current {
            current.push_str(block);
            current_len = block_len;
            has_current = true;
        } else if current_len + BLOCK_SEP.len() + block_len <= max_chars {
            current.push_str(BLOCK_SEP);
            current.push_str(block);
            current_len += BLOCK_SEP.len() + block_len;
        } else {
            chunks.push(std::mem::replace(&mut current, block.to_string()));
            current_len = block_len;
        }
    }
    if has_current {
        chunks.push(current);
    }
    chunks
}

// A cut never separates an escaping backslash from the character it escapes.
fn hard_split(block: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = block.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let mut end = (start + max_chars).min(chars.len());
        if end < chars.len() {
            let trailing = chars[start..end].iter().rev().take_while(|&&c| c == '\\').count();
            if trailing % 2 == 1 && end - start > 1 {
                end -= 1;
            }
        }
        pieces.push(chars[start..end].iter().collect());
        start = end;
    }
    pieces
}
