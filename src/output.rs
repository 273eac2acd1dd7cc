use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `SERVICOS_QUIET=1` silences progress and confirmation output; errors still print
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("SERVICOS_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
