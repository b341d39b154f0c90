use url::form_urlencoded::byte_serialize;

/// Default prefix of the call link; the encoded number is appended.
pub const DEFAULT_CALL_URL_BASE: &str = "http://voice.google.com/calls?a=nc,";

/// Normalize a phone number to E.164-ish form for dialing.
///
/// Assumes US numbers when no country code is given. Returns `None` when the
/// input has no digits.
pub fn format_phone_for_call(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let formatted = if digits.len() == 10 {
        format!("+1{}", digits)
    } else if digits.len() == 11 && digits.starts_with('1') {
        format!("+{}", digits)
    } else if phone.trim_start().starts_with('+') {
        format!("+{}", digits)
    } else {
        format!("+1{}", digits)
    };
    Some(formatted)
}

/// Call link for `phone`, or `None` if it has no digits.
pub fn call_url(base: &str, phone: &str) -> Option<String> {
    let number = format_phone_for_call(phone)?;
    let encoded: String = byte_serialize(number.as_bytes()).collect();
    Some(format!("{}{}", base, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_digits_get_us_prefix() {
        assert_eq!(format_phone_for_call("(704) 555-0100").as_deref(), Some("+17045550100"));
    }

    #[test]
    fn eleven_digits_with_leading_one() {
        assert_eq!(format_phone_for_call("1-704-555-0100").as_deref(), Some("+17045550100"));
        assert_eq!(format_phone_for_call("+1 704 555 0100").as_deref(), Some("+17045550100"));
    }

    #[test]
    fn international_numbers_keep_their_code() {
        assert_eq!(format_phone_for_call("+44 20 7946 0958").as_deref(), Some("+442079460958"));
    }

    #[test]
    fn other_lengths_assume_us() {
        assert_eq!(format_phone_for_call("555-0100").as_deref(), Some("+15550100"));
    }

    #[test]
    fn no_digits() {
        assert_eq!(format_phone_for_call(""), None);
        assert_eq!(format_phone_for_call("ask front desk"), None);
        assert_eq!(call_url(DEFAULT_CALL_URL_BASE, "n/a"), None);
    }

    #[test]
    fn url_encodes_plus() {
        assert_eq!(
            call_url(DEFAULT_CALL_URL_BASE, "704.555.0100").as_deref(),
            Some("http://voice.google.com/calls?a=nc,%2B17045550100")
        );
    }
}
