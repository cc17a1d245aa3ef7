//! Registry trait for named, config-selected implementations.

/// Ties an implementation to the name that selects it in configuration.
///
/// Each pluggable service (account, price feed) exposes one `Registry` struct
/// per implementation, so the builder can look factories up by the
/// `primary = "..."` value of the matching config section.
pub trait ImplementationRegistry {
	/// Key of the implementation table, e.g. "local" for
	/// `[account.implementations.local]` or "coingecko" for
	/// `[price.implementations.coingecko]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	fn factory() -> Self::Factory;
}
