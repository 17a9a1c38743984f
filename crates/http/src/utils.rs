//! Internal helper macros.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Like `assert!`, but for conditions the caller should see as an `Err`.
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
