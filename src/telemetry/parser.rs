use thiserror::Error;

use super::{EcgSample, FieldValue, Reading, VitalsSample};

const ECG_PREFIX: &str = "G:";
const VITALS_PREFIX: &str = "D:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed ECG sample: {0:?}")]
    MalformedEcg(String),
    #[error("unknown line prefix")]
    UnknownPrefix,
}

/// Decode one raw telemetry line.
///
/// Trailing CR/LF is stripped first. Numbers are read leniently: leading
/// whitespace is skipped and the longest numeric prefix is used, so
/// `G:12.5` is 12 and `HR:72bpm` is 72. `G:` lines fail only when no digits
/// lead the value; `D:` lines never fail, each `key:value` pair decodes on
/// its own.
pub fn parse_line(line: &str) -> Result<Reading, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(rest) = line.strip_prefix(ECG_PREFIX) {
        return parse_ecg(rest).map(Reading::Ecg);
    }

    if let Some(rest) = line.strip_prefix(VITALS_PREFIX) {
        return Ok(Reading::Vitals(parse_vitals(rest)));
    }

    Err(ParseError::UnknownPrefix)
}

fn parse_ecg(raw: &str) -> Result<EcgSample, ParseError> {
    integer_prefix(raw.trim_start())
        .parse::<EcgSample>()
        .map_err(|_| ParseError::MalformedEcg(raw.to_string()))
}

fn parse_vitals(raw: &str) -> VitalsSample {
    let mut vitals = VitalsSample::new();

    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        // A bare key still shows up, as not-a-number. Only the segment
        // after the first ':' is the value; anything past a second ':' is noise.
        let mut segments = part.split(':');
        let key = segments.next().unwrap_or(part);
        let value = segments.next().unwrap_or("");
        vitals.insert(key.trim(), parse_field(value));
    }

    vitals
}

fn parse_field(raw: &str) -> FieldValue {
    match float_prefix(raw.trim_start()).parse::<f64>() {
        Ok(v) if v.is_finite() => FieldValue::Number(v),
        _ => FieldValue::NotANumber,
    }
}

fn sign_len(bytes: &[u8]) -> usize {
    usize::from(matches!(bytes.first(), Some(b'+' | b'-')))
}

fn digits_from(bytes: &[u8], start: usize) -> usize {
    bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Optional sign followed by decimal digits. Empty when no digit leads.
fn integer_prefix(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    let sign = sign_len(bytes);
    match digits_from(bytes, sign) {
        0 => "",
        digits => &raw[..sign + digits],
    }
}

/// Optional sign, digits, an optional fraction and an optional exponent.
/// The exponent only counts when at least one digit follows the `e`.
fn float_prefix(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    let mut end = sign_len(bytes);
    let whole = digits_from(bytes, end);
    end += whole;

    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(bytes, end + 1);
        if fraction > 0 {
            end += 1 + fraction;
        }
    }

    if whole == 0 && fraction == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exp_start = end + 1 + sign_len(&bytes[end + 1..]);
        let exp_digits = digits_from(bytes, exp_start);
        if exp_digits > 0 {
            end = exp_start + exp_digits;
        }
    }

    &raw[..end]
}
