//! Sender normalization for per-user limiter keys.

/// Canonical form of an email address for rate limiting
///
/// Lowercases and trims, drops a `+tag` suffix from the local part, and for
/// Gmail addresses also removes dots and folds `googlemail.com` into
/// `gmail.com`. Strings that are not `local@domain` are only lowercased and
/// trimmed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim().to_lowercase();

    let Some((local, domain)) = email.split_once('@') else {
        return email;
    };
    if domain.contains('@') {
        return email;
    }

    let local = local.split_once('+').map_or(local, |(head, _)| head);
    match domain {
        "gmail.com" | "googlemail.com" => format!("{}@gmail.com", local.replace('.', "")),
        _ => format!("{local}@{domain}"),
    }
}

/// Limiter key for one sender
pub fn user_key(email: &str) -> String {
    format!("user:{}", normalize_email(email))
}

/// Limiter key for a process-wide budget
pub fn global_key(name: &str) -> String {
    format!("global:{name}")
}
