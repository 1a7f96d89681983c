mod forms;
mod health_check;
pub use forms::*;
pub use health_check::*;

/// Write an error followed by every `source` below it, one per line. Used by
/// the `Debug` impls of route errors, so that logs show the whole chain.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
