// Core windowing logic, independent of any tokenizer.

/// Cut `ids` into consecutive windows of exactly `max_len` tokens.
///
/// A trailing window shorter than `max_len` is kept only when
/// `include_partials` is set. `max_len` of zero is treated as one.
pub fn window_token_ids(ids: &[u32], max_len: usize, include_partials: bool) -> Vec<&[u32]> {
    let max_len = max_len.max(1);

    let mut out: Vec<&[u32]> = ids.chunks_exact(max_len).collect();
    let rest = ids.chunks_exact(max_len).remainder();
    if include_partials && !rest.is_empty() {
        out.push(rest);
    }
    out
}
