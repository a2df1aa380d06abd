use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// A single parameter of a `RCPT TO:` command, such as the forward path and
/// any ESMTP `KEYWORD[=VALUE]` arguments that follow it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    mailbox: String,
    #[serde(default)]
    parameters: Vec<(String, Option<String>)>,
}

impl Recipient {
    pub fn new(mailbox: impl Into<String>) -> Self {
        Self {
            mailbox: mailbox.into(),
            parameters: Vec::default(),
        }
    }

    /// The recipient address exactly as the client sent it
    #[inline]
    pub fn address(&self) -> &str {
        &self.mailbox
    }

    #[inline]
    pub fn parameters(&self) -> &[(String, Option<String>)] {
        &self.parameters
    }
}

impl Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.mailbox)?;
        for (key, value) in &self.parameters {
            match value {
                Some(value) => write!(f, " {key}={value}")?,
                None => write!(f, " {key}")?,
            }
        }
        Ok(())
    }
}

fn validate_mailbox(mailbox: &str) -> Result<(), ParseError> {
    // RFC 5321 allows a bare postmaster with no domain
    if mailbox.eq_ignore_ascii_case("postmaster") {
        return Ok(());
    }

    match mailbox.rsplit_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !mailbox.chars().any(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(ParseError::InvalidMailbox(mailbox.to_string())),
    }
}

fn parse_parameter(raw: &str) -> Result<(String, Option<String>), ParseError> {
    let (key, value) = raw
        .split_once('=')
        .map_or((raw, None), |(key, value)| (key, Some(value.to_string())));

    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ParseError::InvalidParameter(raw.to_string()));
    }

    Ok((key.to_ascii_uppercase(), value))
}

impl FromStr for Recipient {
    type Err = ParseError;

    /// Parse the argument of a `RCPT TO:` command
    ///
    /// The leading `TO:` and the angle brackets around the path are optional,
    /// so `TO:<a@b.c> NOTIFY=NEVER`, `<a@b.c>` and `a@b.c` are all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut input = s.trim();
        if input
            .get(..3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("to:"))
        {
            input = input[3..].trim_start();
        }

        if input.is_empty() {
            return Err(ParseError::Empty);
        }

        let (mailbox, rest) = if let Some(path) = input.strip_prefix('<') {
            let end = path
                .find('>')
                .ok_or_else(|| ParseError::UnterminatedPath(input.to_string()))?;
            (&path[..end], &path[end + 1..])
        } else {
            input
                .split_once(char::is_whitespace)
                .unwrap_or((input, ""))
        };

        if mailbox.is_empty() {
            return Err(ParseError::Empty);
        }
        validate_mailbox(mailbox)?;

        let parameters = rest
            .split_whitespace()
            .map(parse_parameter)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            mailbox: mailbox.to_string(),
            parameters,
        })
    }
}
