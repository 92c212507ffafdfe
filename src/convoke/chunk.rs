//! The chunking utility shared by the [`chunker`](crate::convoke::workflow::nodes::chunker)
//! workflow node: paragraph-greedy text splitting.

/// Default chunk size in bytes, matching the source material's `1024 * 8`.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 8;

/// Splits `input` into ordered pieces of approximately `size` bytes,
/// preferring paragraph (newline) boundaries: lines are greedily
/// accumulated until the next line would push the running chunk past
/// `size`, at which point the chunk is emitted and accumulation restarts.
///
/// A single line longer than `size` is still emitted whole (never split
/// mid-line) so a chunk is never empty. When `size` is larger than the
/// entire input, exactly one chunk equal to the input is returned.
pub fn split_text_into_chunks(input: &str, size: usize) -> Vec<String> {
    if input.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in input.split('\n') {
        let would_be_len = if current.is_empty() {
            line.len()
        } else {
            current.len() + 1 + line.len()
        };
        if !current.is_empty() && would_be_len > size {
            chunks.push(current);
            current = line.to_string();
        } else if current.is_empty() {
            current = line.to_string();
        } else {
            current.push('\n');
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
