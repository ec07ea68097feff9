use crate::timeline::{Chunk, ResolvedTiming};

const SENTENCE_END: [char; 3] = ['.', '!', '?'];

fn ends_sentence(text: &str) -> bool {
    text.contains(&SENTENCE_END[..])
}

fn close_chunk(tokens: Vec<ResolvedTiming>) -> Chunk {
    let text = tokens
        .iter()
        .map(|t| t.token.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    // Bounds come from the tokens so chunking adds no overlap of its own.
    let start = tokens[0].start;
    let end = tokens[tokens.len() - 1].end;
    Chunk {
        text,
        start,
        end,
        tokens,
    }
}

/// Group resolved tokens into caption chunks. A chunk closes when it holds
/// `max_tokens_per_chunk` tokens or its latest token ends a sentence.
pub fn chunk(resolved: &[ResolvedTiming], max_tokens_per_chunk: usize) -> Vec<Chunk> {
    let limit = max_tokens_per_chunk.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<ResolvedTiming> = Vec::with_capacity(limit);

    for timing in resolved {
        current.push(timing.clone());
        if current.len() >= limit || ends_sentence(&timing.token.text) {
            chunks.push(close_chunk(std::mem::take(&mut current)));
        }
    }

    if !current.is_empty() {
        chunks.push(close_chunk(current));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::uniform_timings;
    use crate::tokenizer::tokenize;

    fn chunk_texts(text: &str, max: usize) -> Vec<String> {
        let timings = uniform_timings(&tokenize(text), 10.0);
        chunk(&timings, max).into_iter().map(|c| c.text).collect()
    }

    #[test]
    fn closes_on_size_limit() {
        assert_eq!(
            chunk_texts("one two three four five six seven", 3),
            vec!["one two three", "four five six", "seven"]
        );
    }

    #[test]
    fn closes_on_sentence_end() {
        assert_eq!(
            chunk_texts("Stop. Breathe now! Why not? Go", 3),
            vec!["Stop.", "Breathe now!", "Why not?", "Go"]
        );
    }

    #[test]
    fn single_chunk_for_short_sentence() {
        let timings = uniform_timings(&tokenize("Trust your clarity."), 3.0);
        let chunks = chunk(&timings, 3);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Trust your clarity.");
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks[0].end, 3.0);
    }

    #[test]
    fn chunking_is_lossless() {
        let tokens = tokenize("The obstacle is the way. What stands in the way becomes the way!");
        let timings = uniform_timings(&tokens, 6.0);
        let chunks = chunk(&timings, 4);

        let flattened: Vec<_> = chunks.iter().flat_map(|c| c.token_refs().cloned()).collect();
        assert_eq!(flattened, tokens);
        for c in &chunks {
            assert_eq!(c.start, c.tokens[0].start);
            assert_eq!(c.end, c.tokens[c.tokens.len() - 1].end);
        }
        for pair in chunks.windows(2) {
            assert!(pair[1].start >= pair[0].end);
        }
    }

    #[test]
    fn no_timings_no_chunks() {
        assert!(chunk(&[], 3).is_empty());
    }
}
