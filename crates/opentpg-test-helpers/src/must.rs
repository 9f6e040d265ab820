//! Unwrap helpers with `#[track_caller]`.

/// Unwrap a `Result`, panicking with the error's `Debug` form.
#[track_caller]
pub fn must<T, E: std::fmt::Debug>(r: Result<T, E>) -> T {
    match r {
        Ok(v) => v,
        Err(e) => panic!("must failed: {e:?}"),
    }
}

/// Unwrap an `Option` with a caller-supplied message.
#[track_caller]
pub fn must_some<T>(o: Option<T>, msg: &str) -> T {
    match o {
        Some(v) => v,
        None => panic!("must_some failed: {msg}"),
    }
}
