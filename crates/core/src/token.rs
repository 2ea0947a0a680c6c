//! Anti-forgery token extraction from portal markup.
//!
//! Every state-changing POST requires the per-page hidden
//! `__RequestVerificationToken` value. The portal renders it as a hidden
//! `<input>`; extraction is a pure function over the page source so request
//! code stays free of parse control flow.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::{CxError, Result};

const TOKEN_FIELD: &str = "__RequestVerificationToken";

static NAME_THEN_VALUE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?is)<input[^>]*name=["']__RequestVerificationToken["'][^>]*value=["']([^"']+)["']"#).unwrap()
});

static VALUE_THEN_NAME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?is)<input[^>]*value=["']([^"']+)["'][^>]*name=["']__RequestVerificationToken["']"#).unwrap()
});

/// Finds the hidden anti-forgery token in `html`.
///
/// Attribute order is not guaranteed by the portal, so both orderings are
/// tried. A missing token means the page structure changed upstream (or an
/// invalidated session was served a different page entirely) and is fatal
/// for the call.
pub fn extract_token(html: &str) -> Result<String> {
	NAME_THEN_VALUE
		.captures(html)
		.or_else(|| VALUE_THEN_NAME.captures(html))
		.map(|caps| caps[1].to_string())
		.ok_or_else(|| CxError::Parse(format!("missing verification token ({TOKEN_FIELD})")))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_token_from_login_page() {
		let html = r#"<html><body><form action="/Account/Login" method="post">
			<input name="__RequestVerificationToken" type="hidden" value="abc123XYZ" />
			<input name="Username" type="text" />
		</form></body></html>"#;
		assert_eq!(extract_token(html).unwrap(), "abc123XYZ");
	}

	#[test]
	fn extracts_token_with_value_before_name() {
		let html = r#"<input type="hidden" value="tok-42" name="__RequestVerificationToken">"#;
		assert_eq!(extract_token(html).unwrap(), "tok-42");
	}

	#[test]
	fn missing_token_is_a_parse_error() {
		let html = "<html><body><p>Scheduled maintenance</p></body></html>";
		let err = extract_token(html).unwrap_err();
		assert!(matches!(err, CxError::Parse(_)), "got {err:?}");
	}

	#[test]
	fn ignores_other_hidden_inputs() {
		let html = r#"<input name="ReturnUrl" type="hidden" value="/Home">
			<input name="__RequestVerificationToken" type="hidden" value="real">"#;
		assert_eq!(extract_token(html).unwrap(), "real");
	}
}
