//! Structured context logging.
//!
//! Every context-level event carries the same fields so log lines from
//! several tabs interleaved in one process can be told apart:
//! - `tab`: level the context renders
//! - `context`: short id of the context instance

/// Log a context event with standard fields.
///
/// ```rust,ignore
/// log_context_event!(info, tab, context_id, "Context opened", transport = %kind);
/// ```
#[macro_export]
macro_rules! log_context_event {
    ($level:ident, $tab:expr, $context:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            tab = %$tab,
            context = %$context,
            $($($field)*,)?
            $msg
        )
    };
}
