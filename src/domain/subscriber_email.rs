#[derive(Debug, Clone)]
/// A structurally valid email address: `local@domain.tld`, where no part
/// contains whitespace or a second `@`. This is a minimal shape check, not an
/// RFC 5322 parser.
///
/// Used for subscribers, senders and the operator address alike.
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// The input is expected to be trimmed already; surrounding whitespace is
    /// rejected like any other whitespace.
    pub fn parse(email: String) -> Result<Self, String> {
        has_address_shape(&email)
            .then_some(Self(email.clone()))
            .ok_or(format!("Invalid email: {email:?}"))
    }
}

/// Unicode whitespace, plus U+FEFF (zero-width no-break space / BOM), which
/// `char::is_whitespace` leaves out but pasted addresses often carry.
pub fn is_email_whitespace(c: char) -> bool { c.is_whitespace() || c == '\u{feff}' }

/// Equivalent to matching `^[^\s@]+@[^\s@]+\.[^\s@]+$`
fn has_address_shape(s: &str) -> bool {
    if s.chars().any(is_email_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // at least one char on either side of some '.' in the domain
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
