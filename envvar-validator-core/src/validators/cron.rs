//! Five-field cron expression checks.

const MONTH_NAMES: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const DAY_NAMES: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

struct CronField {
    label: &'static str,
    min: u32,
    max: u32,
    /// Names accepted in place of numbers, starting at `min`
    names: &'static [&'static str],
}

const FIELDS: [CronField; 5] = [
    CronField { label: "minute", min: 0, max: 59, names: &[] },
    CronField { label: "hour", min: 0, max: 23, names: &[] },
    CronField { label: "day-of-month", min: 1, max: 31, names: &[] },
    CronField { label: "month", min: 1, max: 12, names: MONTH_NAMES },
    // 7 is an alias for Sunday
    CronField { label: "day-of-week", min: 0, max: 7, names: DAY_NAMES },
];

/// Checks `expression` against the standard five-field layout.
///
/// Supports `*`, `*/n`, single values, `a-b`, `a-b/n` and comma lists.
/// Month and weekday fields also accept three-letter English names.
pub(crate) fn check_cron_expression(expression: &str) -> Result<(), String> {
    let parts: Vec<&str> = expression.split_whitespace().collect();
    if parts.len() != FIELDS.len() {
        return Err(format!("expected 5 fields, found {}", parts.len()));
    }

    for (part, field) in parts.iter().zip(FIELDS.iter()) {
        for item in part.split(',') {
            check_item(item, field)?;
        }
    }
    Ok(())
}

fn check_item(item: &str, field: &CronField) -> Result<(), String> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (item, None),
    };

    if let Some(step) = step {
        match step.parse::<u32>() {
            Ok(n) if n > 0 => {}
            _ => return Err(format!("invalid step in {} field", field.label)),
        }
    }

    if range == "*" {
        return Ok(());
    }

    match range.split_once('-') {
        Some((start, end)) => {
            let start = parse_value(start, field)?;
            let end = parse_value(end, field)?;
            if start > end {
                return Err(format!("range start exceeds range end in {} field", field.label));
            }
            Ok(())
        }
        None => parse_value(range, field).map(|_| ()),
    }
}

fn parse_value(raw: &str, field: &CronField) -> Result<u32, String> {
    let value = match raw.parse::<u32>() {
        Ok(n) => n,
        Err(_) => field
            .names
            .iter()
            .position(|name| name.eq_ignore_ascii_case(raw))
            .and_then(|index| u32::try_from(index).ok())
            .map(|index| index + field.min)
            .ok_or_else(|| format!("unrecognized token in {} field", field.label))?,
    };

    if (field.min..=field.max).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{} field must be between {} and {}",
            field.label, field.min, field.max
        ))
    }
}
