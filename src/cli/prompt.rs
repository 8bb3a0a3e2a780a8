//! Interactive confirmation and external IP disclosure.

use crate::error::{QueryError, QueryResult};
use console::style;
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Service reporting the caller's public address.
const MYIP_URL: &str = "https://api.myip.com";

/// The caller's public address as seen from the Internet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalIp {
    pub ip: String,
    #[serde(default)]
    pub country: String,
}

/// Look up the caller's external IP and country.
pub async fn external_ip(timeout: Duration) -> QueryResult<ExternalIp> {
    let fault = |e: reqwest::Error| QueryError::Fault(e.to_string());

    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(fault)?
        .get(MYIP_URL)
        .send()
        .await
        .map_err(fault)?
        .error_for_status()
        .map_err(fault)?
        .json()
        .await
        .map_err(fault)
}

/// Interpret a yes/no answer. Blank input takes the default.
pub fn parse_answer(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "ye" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Ask a yes/no question on the terminal until a valid answer is given.
///
/// Blocks on stdin; async callers should run it on a blocking thread.
pub fn confirm(question: &str, default: bool) -> io::Result<bool> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    confirm_from(&mut stdin.lock(), &mut stdout.lock(), question, default)
}

/// Ask a yes/no question on `output`, reading answers from `input`.
///
/// End of input counts as the default answer.
pub fn confirm_from<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: bool,
) -> io::Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };

    loop {
        write!(output, "{} {} ", style(question).bold(), hint)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(default);
        }

        match parse_answer(&line, default) {
            Some(answer) => return Ok(answer),
            None => writeln!(output, "Please respond with 'yes' (y) or 'no' (n).")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n", false), Some(true));
        assert_eq!(parse_answer("YES", false), Some(true));
        assert_eq!(parse_answer("ye", false), Some(true));
        assert_eq!(parse_answer("n", true), Some(false));
        assert_eq!(parse_answer("No", true), Some(false));
        assert_eq!(parse_answer("   ", false), Some(false));
        assert_eq!(parse_answer("", true), Some(true));
        assert_eq!(parse_answer("maybe", false), None);
    }

    fn ask(input: &str, default: bool) -> (bool, String) {
        let mut output = Vec::new();
        let answer =
            confirm_from(&mut input.as_bytes(), &mut output, "Continue?", default).unwrap();
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_confirm_accepts_answer() {
        let (answer, output) = ask("y\n", false);
        assert!(answer);
        assert!(output.contains("[y/N]"));
    }

    #[test]
    fn test_confirm_asks_again_after_invalid_answer() {
        let (answer, output) = ask("maybe\nno\n", true);
        assert!(!answer);
        assert!(output.contains("Please respond with 'yes' (y) or 'no' (n)."));
        assert_eq!(output.matches("Continue?").count(), 2);
    }

    #[test]
    fn test_confirm_end_of_input_takes_default() {
        assert!(!ask("", false).0);
        assert!(ask("", true).0);
        assert!(!ask("what\n", false).0);
    }

    #[test]
    fn test_external_ip_parse() {
        let parsed: ExternalIp =
            serde_json::from_str(r#"{"ip":"203.0.113.4","country":"Germany","cc":"DE"}"#).unwrap();
        assert_eq!(parsed.ip, "203.0.113.4");
        assert_eq!(parsed.country, "Germany");
    }
}
