mod form_data;
mod not_found;
mod subscriptions;

pub use form_data::FormData;
pub use not_found::*;
pub use subscriptions::*;

/// Print an error followed by every `source` in its chain. Used for `Debug`
/// impls, so that logs show the full cause chain rather than the top-level
/// message alone.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }
    Ok(())
}
