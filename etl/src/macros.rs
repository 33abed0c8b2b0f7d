//! Macros for ETL error handling.
//!
//! Provides convenience macros for creating and returning [`crate::error::EtlError`] instances with
//! reduced boilerplate for common error handling patterns.

/// Creates an [`crate::error::EtlError`] from error kind and description.
///
/// The optional detail is rendered with [`ToString`], and an optional source error can follow
/// it.
#[macro_export]
macro_rules! etl_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::EtlError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::EtlError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::EtlError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Creates and returns an [`crate::error::EtlError`] with a detail from the current function.
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::etl_error!($kind, $desc, $detail))
    };
}
