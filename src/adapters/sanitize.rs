//! Log sanitization for questionnaire data and key material.
//!
//! Screening answers are health data. Nothing in the crate logs them on
//! purpose, but formatted errors and debug output can carry fragments, so
//! every log line goes through [`sanitize`] before it reaches the sink:
//! - Encoded feature vectors (runs of numbers in brackets)
//! - Age and answer fields (`age=34`, `"A3_Score": 1`)
//! - Demographic fields (`country=...`, `ethnicity: ...`)
//! - Signing keys, signatures and long hex/base64 tokens
//!
//! Input is capped at `AQSCREEN_SANITIZE_MAX_BYTES` (16 KiB by default).

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<RedactionPatterns> = OnceLock::new();

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct RedactionPattern {
    regex: Regex,
    replacement: &'static str,
}

struct RedactionPatterns {
    set: RegexSet,
    patterns: Vec<RedactionPattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("AQSCREEN_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

// Order matters: field rules run before the generic token rules so a
// `signature=<hex>` pair is reported as a secret rather than a bare key.
const RULES: [(&str, &str); 8] = [
    // Feature vectors and answer arrays: five or more numbers in brackets
    (
        r"\[\s*-?\d+(?:\.\d+)?(?:\s*,\s*-?\d+(?:\.\d+)?){4,}\s*,?\s*\]",
        "[REDACTED-FEATURES]",
    ),
    // Per-question scores
    (
        r#"(?i)"?\bA(?:10|[1-9])(?:_Score)?"?\s*[:=]\s*"?(?:yes|no|[01](?:\.0)?)"?"#,
        "[REDACTED-ANSWER]",
    ),
    // Age, behavioral score and flags. The training column `result` only
    // in its quoted form.
    (
        r#"(?i)(?:"result"|"?\b(?:age|behavioral_score|jaundice|jaundice_history|austim|family_autism_history)"?)\s*[:=]\s*"?[\w.]+"?"#,
        "[REDACTED-FIELD]",
    ),
    // Demographics (quoted values may contain spaces)
    (
        r#"(?i)"?\b(?:country|contry_of_res|ethnicity|relation|gender)"?\s*[:=]\s*(?:"[^"\n]{0,80}"|[\w-]+)"#,
        "[REDACTED-FIELD]",
    ),
    // Contextual secrets
    (
        r"(?i)\b(?:secret|private[_-]?key|signing[_-]?key|seed|signature|sig|key)\b\s*[:=]\s*[A-Za-z0-9+/]{32,}={0,2}",
        "[REDACTED-SECRET]",
    ),
    (
        r"(?i)\b(?:secret|private[_-]?key|signing[_-]?key|seed|signature|sig|key)\b\s*[:=]\s*[0-9a-fA-F]{16,}\b",
        "[REDACTED-SECRET]",
    ),
    // Bare hex key material (digests, raw keys)
    (r"\b[0-9a-fA-F]{32,}\b", "[REDACTED-KEY]"),
    // Bare base64 Ed25519 keys (32 bytes encode to 44 chars)
    (r"\b[A-Za-z0-9+/]{43}=", "[REDACTED-KEY]"),
];

fn get_patterns() -> &'static RedactionPatterns {
    PATTERNS.get_or_init(|| {
        // Patterns are compile-time constants; failure here is a programming error.
        let set = RegexSet::new(RULES.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = RULES
            .iter()
            .map(|(pattern, replacement)| RedactionPattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();
        RedactionPatterns { set, patterns }
    })
}

/// Redact questionnaire data and key material from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let matched: Vec<usize> = patterns.set.matches(prefix).into_iter().collect();
    let mut result = prefix.to_string();
    for idx in matched {
        let pattern = &patterns.patterns[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer that sanitizes each formatted line before
/// handing it to the wrapped writer.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let sanitized = sanitize(&String::from_utf8_lossy(&line));
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A formatter writing one huge line must not buffer without bound.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n[TRUNCATED]\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}
