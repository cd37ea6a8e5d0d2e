/// Upper bound on the number of fragments an answer is streamed in.
pub const TARGET_CHUNKS: usize = 20;

/// Splits a finished answer into roughly [`TARGET_CHUNKS`] word groups.
///
/// Every fragment after the first carries a leading space, so concatenating
/// the fragments yields the answer's words joined by single spaces. Runs of
/// other whitespace (newlines included) are not preserved.
pub fn chunk_answer(answer: &str) -> Vec<String> {
    let words: Vec<&str> = answer.split_whitespace().collect();
    let chunk_size = (words.len() / TARGET_CHUNKS).max(1);

    words
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, group)| {
            let content = group.join(" ");
            if i > 0 {
                format!(" {}", content)
            } else {
                content
            }
        })
        .collect()
}
