//! JID helpers: phone number ↔ personal JID conversions.

/// Server suffix of personal (phone-number based) JIDs.
pub const USER_SERVER: &str = "s.whatsapp.net";
/// Server suffix of group JIDs.
pub const GROUP_SERVER: &str = "g.us";

/// Phone number encoded in a personal JID, if any.
///
/// `@lid` and group JIDs carry no phone number.
pub fn phone_from_jid(jid: &str) -> Option<&str> {
    let (user, server) = jid.split_once('@')?;
    if server == USER_SERVER && !user.is_empty() {
        // Device-qualified JIDs look like `972500000001:12@s.whatsapp.net`.
        Some(user.split(':').next().unwrap_or(user))
    } else {
        None
    }
}

pub fn is_group_jid(jid: &str) -> bool {
    jid.rsplit_once('@')
        .is_some_and(|(user, server)| server == GROUP_SERVER && !user.is_empty())
}

/// Candidate international forms of a phone number, most likely first.
///
/// Separators are stripped. Local numbers (leading `0`) get `country_code`
/// in place of the `0`; numbers already carrying the country code also yield
/// their local forms.
pub fn phone_variations(phone: &str, country_code: &str) -> Vec<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Vec::new();
    }

    let mut variations = Vec::new();
    if let Some(local) = digits.strip_prefix('0') {
        variations.push(format!("{country_code}{local}"));
        variations.push(digits.clone());
        variations.push(local.to_string());
    } else if let Some(national) = digits
        .strip_prefix(country_code)
        .filter(|_| !country_code.is_empty())
    {
        variations.push(digits.clone());
        variations.push(national.to_string());
        if !national.starts_with('0') {
            variations.push(format!("0{national}"));
        }
    } else {
        variations.push(digits.clone());
        variations.push(format!("{country_code}{digits}"));
        variations.push(format!("0{digits}"));
    }

    let mut unique = Vec::with_capacity(variations.len());
    for v in variations {
        if !v.is_empty() && !unique.contains(&v) {
            unique.push(v);
        }
    }
    unique
}

/// Personal JID for a phone number, using its most likely international form.
pub fn phone_to_jid(phone: &str, country_code: &str) -> Option<String> {
    phone_variations(phone, country_code)
        .into_iter()
        .next()
        .map(|number| format!("{number}@{USER_SERVER}"))
}
