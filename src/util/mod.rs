use std::sync::atomic::{AtomicUsize, Ordering};

const TMP_PREFIX: &str = "tmp-";

static COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Mint a process-unique token for an annotation the server has not named yet.
pub fn unique_token() -> String {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{TMP_PREFIX}{n}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_unique_tokens_never_repeat() {
        let tokens: HashSet<String> = (0..100).map(|_| unique_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_unique_token_is_tmp() {
        assert!(unique_token().starts_with(TMP_PREFIX));
    }
}
