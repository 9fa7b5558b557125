//! Recognizes the `<functioncall>` directive local models embed in plain text.
//!
//! The directive runs from the opening marker up to the next `<`, which is
//! usually the start of a closing tag. The payload itself therefore cannot
//! contain a literal `<`.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::schemas::CallDescriptor;

pub const FUNCTION_CALL_START: &str = "<functioncall>";
pub const FUNCTION_CALL_END: char = '<';

#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("no valid function call found")]
    MissingDirective,
    #[error("error decoding function call: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Returns the trimmed text between the first `<functioncall>` and the next `<`.
pub fn extract_directive(text: &str) -> Option<&str> {
    let start = text.find(FUNCTION_CALL_START)? + FUNCTION_CALL_START.len();
    let rest = &text[start..];
    let end = rest.find(FUNCTION_CALL_END)?;
    Some(rest[..end].trim())
}

/// Drops every apostrophe from the payload.
///
/// Models often wrap the arguments object in single quotes, which this
/// repairs. It is lossy: an apostrophe inside a value (`O'Brien`) is removed
/// too, and payloads quoted with `'` instead of `"` will not decode at all.
pub fn normalize_quotes(raw: &str) -> String {
    raw.replace('\'', "")
}

/// Parses the first function-call directive in `text`.
pub fn parse_directive(text: &str) -> Result<CallDescriptor, DirectiveError> {
    let region = extract_directive(text).ok_or(DirectiveError::MissingDirective)?;
    let normalized = normalize_quotes(region);
    let call = serde_json::from_str::<CallDescriptor>(&normalized)?;
    Ok(call)
}

/// Like [`parse_directive`], but a missing or undecodable directive is just `None`.
pub fn extract(text: &str) -> Option<CallDescriptor> {
    match parse_directive(text) {
        Ok(call) => {
            debug!(capability = %call.name, "function call found");
            Some(call)
        }
        Err(DirectiveError::MissingDirective) => {
            info!("no valid function call found");
            None
        }
        Err(e) => {
            warn!(error = %e, "error decoding function call");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn amzn() -> CallDescriptor {
        CallDescriptor::new("get_stock_price", json!({"symbol": "AMZN"}))
    }

    #[test]
    fn plain_text_has_no_call() {
        assert!(extract("Amazon is trading around $178 today.").is_none());
        assert!(matches!(
            parse_directive("no tags here"),
            Err(DirectiveError::MissingDirective)
        ));
    }

    #[test]
    fn well_formed_directive() {
        let s = r#"<functioncall>{"name": "get_stock_price", "arguments": {"symbol": "AMZN"}}<"#;
        assert_eq!(extract(s), Some(amzn()));
    }

    #[test]
    fn directive_with_surrounding_text_and_closing_tag() {
        let s = "Sure, let me check.\n<functioncall>\n{\"name\": \"get_stock_price\", \"arguments\": {\"symbol\": \"AMZN\"}}\n</functioncall>\nOne moment.";
        assert_eq!(extract(s), Some(amzn()));
    }

    #[test]
    fn single_quoted_arguments_string_decodes_like_object() {
        let s = r#"<functioncall> {"name": "get_stock_price", "arguments": '{"symbol": "AMZN"}'} <|endoftext|>"#;
        assert_eq!(extract(s), Some(amzn()));
    }

    #[test]
    fn single_quotes_instead_of_double_quotes_do_not_decode() {
        let s = "<functioncall>{'name': 'get_stock_price', 'arguments': {'symbol': 'AMZN'}}<";
        assert!(matches!(
            parse_directive(s),
            Err(DirectiveError::InvalidJson(_))
        ));
        assert!(extract(s).is_none());
    }

    #[test]
    fn apostrophe_in_value_is_silently_corrupted() {
        let s = r#"<functioncall>{"name": "lookup_person", "arguments": {"surname": "O'Brien"}}<"#;
        let call = extract(s).unwrap();
        assert_eq!(call.arguments, Some(json!({"surname": "OBrien"})));
    }

    #[test]
    fn only_first_directive_is_used() {
        let s = concat!(
            r#"<functioncall>{"name": "get_stock_price", "arguments": {"symbol": "AMZN"}}</functioncall>"#,
            r#"<functioncall>{"name": "get_stock_price", "arguments": {"symbol": "MSFT"}}</functioncall>"#,
        );
        assert_eq!(extract(s), Some(amzn()));
    }

    #[test]
    fn missing_terminator_is_not_a_match() {
        let s = r#"<functioncall>{"name": "get_stock_price", "arguments": {"symbol": "AMZN"}}"#;
        assert!(extract_directive(s).is_none());
        assert!(extract(s).is_none());
    }

    #[test]
    fn empty_region_is_a_decode_failure() {
        let s = "<functioncall>   </functioncall>";
        assert_eq!(extract_directive(s), Some(""));
        assert!(matches!(
            parse_directive(s),
            Err(DirectiveError::InvalidJson(_))
        ));
        assert!(extract(s).is_none());
    }

    #[test]
    fn parameters_key_is_kept() {
        let s = r#"<functioncall>{"name": "get_stock_price", "parameters": {"symbol": "TSLA"}}<"#;
        let call = extract(s).unwrap();
        assert_eq!(call.arguments, None);
        assert_eq!(call.payload(), Some(&json!({"symbol": "TSLA"})));
    }

    #[test]
    fn missing_name_is_a_decode_failure() {
        let s = r#"<functioncall>{"arguments": {"symbol": "AMZN"}}<"#;
        assert!(extract(s).is_none());
    }
}
