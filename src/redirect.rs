//! Parser for the authorization redirect pasted back after interactive sign-in.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{CrawlerError, Result};

/// Characters an authorization code may contain.
static CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._~-]+$").expect("Invalid code regex"));

/// Extract the authorization code from a redirect URL or validate a raw code.
///
/// Accepts either the full URL the browser was redirected to, e.g.
/// `http://localhost:5000/getAToken?code=<CODE>&state=<STATE>`, or the bare
/// code. When `expected_state` is given, a redirect URL must carry the same
/// `state`. An `error` parameter is reported as an authentication failure.
///
/// # Examples
///
/// ```
/// use sharepoint_crawler::redirect::extract_auth_code;
///
/// let code = extract_auth_code(
///     "http://localhost:5000/getAToken?code=0.AXYA-abc&state=s1",
///     Some("s1"),
/// )
/// .unwrap();
/// assert_eq!(code, "0.AXYA-abc");
///
/// let code = extract_auth_code("0.AXYA-abc", None).unwrap();
/// assert_eq!(code, "0.AXYA-abc");
/// ```
pub fn extract_auth_code(input: &str, expected_state: Option<&str>) -> Result<String> {
    let trimmed = input.trim();

    if let Ok(url) = Url::parse(trimmed) {
        if !url.cannot_be_a_base() {
            return code_from_redirect(&url, expected_state);
        }
    }

    if !trimmed.is_empty() && CODE_REGEX.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(CrawlerError::InvalidRedirect(input.to_string()))
}

fn code_from_redirect(url: &Url, expected_state: Option<&str>) -> Result<String> {
    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(error) = param("error") {
        let description = param("error_description").unwrap_or_default();
        return Err(CrawlerError::AuthenticationError(format!(
            "{}: {}",
            error, description
        )));
    }

    if let Some(expected) = expected_state {
        if param("state").as_deref() != Some(expected) {
            return Err(CrawlerError::InvalidRedirect(
                "state does not match the sign-in request".to_string(),
            ));
        }
    }

    match param("code") {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(CrawlerError::InvalidRedirect(format!(
            "no authorization code in {}",
            url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_redirect_url() {
        let url = "http://localhost:5000/getAToken?code=abc123&state=xyz&session_state=s";
        assert_eq!(extract_auth_code(url, Some("xyz")).unwrap(), "abc123");
    }

    #[test]
    fn test_state_is_optional_when_not_expected() {
        let url = "http://localhost:5000/getAToken?code=abc123";
        assert_eq!(extract_auth_code(url, None).unwrap(), "abc123");
    }

    #[test]
    fn test_state_mismatch() {
        let url = "http://localhost:5000/getAToken?code=abc123&state=other";
        assert!(matches!(
            extract_auth_code(url, Some("xyz")),
            Err(CrawlerError::InvalidRedirect(_))
        ));
    }

    #[test]
    fn test_raw_code() {
        assert_eq!(extract_auth_code("  0.AXYA_b-c~d  ", None).unwrap(), "0.AXYA_b-c~d");
    }

    #[test]
    fn test_invalid_input() {
        assert!(extract_auth_code("", None).is_err());
        assert!(extract_auth_code("   ", None).is_err());
        assert!(extract_auth_code("not a code", None).is_err());
    }
}
