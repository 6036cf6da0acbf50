//! Compact duration strings: `"15m"`, `"2h"`, `"2d"`, `"3w"`.

use chrono::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,

    #[error("unknown time unit '{0}' (expected one of m, h, d, w)")]
    UnknownUnit(char),

    #[error("invalid duration amount '{0}'")]
    InvalidAmount(String),
}

/// Parse `<integer><unit>` where unit is minutes, hours, days or weeks.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let input = input.trim();
    let unit = input.chars().last().ok_or(DurationParseError::Empty)?;
    let amount = &input[..input.len() - unit.len_utf8()];
    let amount: i64 = amount
        .parse()
        .map_err(|_| DurationParseError::InvalidAmount(amount.to_string()))?;

    let duration = match unit {
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        'w' => Duration::try_weeks(amount),
        other => return Err(DurationParseError::UnknownUnit(other)),
    };
    duration.ok_or_else(|| DurationParseError::InvalidAmount(amount.to_string()))
}

/// Inverse of [`parse_duration`] for log output: the largest unit that divides evenly.
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    if duration != Duration::minutes(minutes) {
        return format!("{}s", duration.num_seconds());
    }
    match minutes {
        0 => "0m".to_string(),
        m if m % (60 * 24 * 7) == 0 => format!("{}w", m / (60 * 24 * 7)),
        m if m % (60 * 24) == 0 => format!("{}d", m / (60 * 24)),
        m if m % 60 == 0 => format!("{}h", m / 60),
        m => format!("{m}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::minutes("15m", Duration::minutes(15))]
    #[case::hours("2h", Duration::hours(2))]
    #[case::days("2d", Duration::days(2))]
    #[case::weeks("3w", Duration::days(21))]
    #[case::padded(" 1d ", Duration::days(1))]
    fn parses_supported_units(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(parse_duration(input), Ok(expected));
    }

    #[rstest]
    #[case(Duration::minutes(90), "90m")]
    #[case(Duration::hours(48), "2d")]
    #[case(Duration::days(14), "2w")]
    #[case(Duration::seconds(30), "30s")]
    fn formats_with_largest_even_unit(#[case] input: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(input), expected);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse_duration(""), Err(DurationParseError::Empty));
        assert_eq!(parse_duration("2y"), Err(DurationParseError::UnknownUnit('y')));
        assert_eq!(
            parse_duration("xd"),
            Err(DurationParseError::InvalidAmount("x".to_string()))
        );
    }
}
