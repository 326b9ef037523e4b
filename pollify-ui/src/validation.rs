//! Form checks run before anything is sent to the server.

/// Shown when a poll form is incomplete
pub const POLL_INCOMPLETE: &str = "Poll must have a question and at least two options.";

/// Smallest password the server accepts
pub const MIN_PASSWORD_LEN: usize = 6;

/// Trimmed question and non-empty options
#[derive(Debug, Clone, PartialEq)]
pub struct PollForm {
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<String>,
}

/// Trim everything, drop blank options, require a question and two options.
pub fn validate_poll(
    question: &str,
    description: &str,
    options: &[String],
) -> Result<PollForm, &'static str> {
    let question = question.trim().to_string();
    let options: Vec<String> = options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if question.is_empty() || options.len() < 2 {
        return Err(POLL_INCOMPLETE);
    }

    let description = Some(description.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(PollForm {
        question,
        description,
        options,
    })
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), String> {
    let email = email.trim();
    let well_formed = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
        .unwrap_or(false);

    if !well_formed {
        return Err("Please enter a valid email address".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

/// Share of `total` as a whole percentage
pub fn percent(votes: u64, total: u64) -> u32 {
    if total == 0 {
        0
    } else {
        ((votes as f64 / total as f64) * 100.0).round() as u32
    }
}
