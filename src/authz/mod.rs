//! Permission authorization: deciding whether granted patterns cover the
//! action a request implies.

mod matcher;

use http::Method;
pub use matcher::PatternCache;

/// Compute the action string a request must be authorized for.
///
/// The verb mapping is closed: GET reads, POST writes, and every other
/// method yields `None`, never implicitly permitted. The action is a pure
/// function of (method, namespace prefix, resource key), so permission
/// patterns are expressed in terms of prefixed keys.
pub fn required_action(method: &Method, key_prefix: &str, key: &str) -> Option<String> {
    let verb = match *method {
        Method::GET => "read",
        Method::POST => "write",
        _ => return None,
    };

    Some(format!("{}:{}{}", verb, key_prefix, key))
}

/// Whether any granted pattern matches the required action.
///
/// First match wins; order cannot change the outcome, only how soon the
/// scan stops. An empty grant list denies. No I/O, no failure mode beyond
/// deny: a malformed pattern simply never matches.
pub fn authorize(patterns: &PatternCache, granted: &[String], action: &str) -> bool {
    granted.iter().any(|pattern| patterns.matches(pattern, action))
}
