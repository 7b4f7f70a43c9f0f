//! Error handling foundation for the callflow crates.
//!
//! This module provides only the `Result` type alias using rootcause.
//! Each crate defines its own domain-specific error types in its own
//! error module; the editing session reports failures to the host page as
//! `Report`s so that context can be layered on as they propagate.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct SaveRejected;

    impl fmt::Display for SaveRejected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "save rejected")
        }
    }

    impl std::error::Error for SaveRejected {}

    fn save(ok: bool) -> Result<u64, SaveRejected> {
        if ok { Ok(7) } else { Err(SaveRejected.into()) }
    }

    #[test]
    fn context_converts_into_report() {
        assert_eq!(save(true).expect("should save"), 7);
        let err = save(false).unwrap_err();
        assert!(err.to_string().contains("save rejected"));
    }
}
