//! Centralized number formatting utilities.
//!
//! All report formatting (CLI tables, worker summaries) goes through this
//! module so DPS values, damage totals and simulated timestamps read the same
//! everywhere.

/// Insert `,` thousands separators into the integer part of a formatted number.
fn group_thousands(s: &str) -> String {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let (int_part, frac_part) = match rest.find('.') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}{}", sign, grouped, frac_part)
}

/// Format a DPS value with two decimals and thousands separators.
///
/// # Examples
/// ```
/// use gcdsim_types::formatting::format_dps;
/// assert_eq!(format_dps(0.0), "0.00");
/// assert_eq!(format_dps(512.345), "512.35");
/// assert_eq!(format_dps(12_345.6), "12,345.60");
/// ```
pub fn format_dps(dps: f64) -> String {
    group_thousands(&format!("{:.2}", dps))
}

/// Format a large f64 number with K/M suffix for compact display.
///
/// - Values >= 1,000,000 are formatted as `X.XXM`
/// - Values >= 1,000 are formatted as `X.XXK`
/// - Values below 1,000 are formatted without decimals
///
/// # Examples
/// ```
/// use gcdsim_types::formatting::format_compact;
/// assert_eq!(format_compact(500.0), "500");
/// assert_eq!(format_compact(1_500.0), "1.50K");
/// assert_eq!(format_compact(1_500_000.0), "1.50M");
/// ```
pub fn format_compact(n: f64) -> String {
    let n_abs = n.abs();
    if n_abs >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n_abs >= 1_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.0}", n)
    }
}

/// Format a simulated timestamp as `M:SS.ss`.
///
/// Negative values (pre-pull actions) keep their sign.
///
/// # Examples
/// ```
/// use gcdsim_types::formatting::format_sim_time;
/// assert_eq!(format_sim_time(0.0), "0:00.00");
/// assert_eq!(format_sim_time(62.5), "1:02.50");
/// assert_eq!(format_sim_time(-1.25), "-0:01.25");
/// ```
pub fn format_sim_time(secs: f64) -> String {
    let sign = if secs < 0.0 { "-" } else { "" };
    let secs = secs.abs();
    let mins = (secs / 60.0).floor() as u64;
    let remaining = secs - (mins as f64 * 60.0);
    format!("{}{}:{:05.2}", sign, mins, remaining)
}

/// Format a duration as `M:SS` from whole seconds.
///
/// # Examples
/// ```
/// use gcdsim_types::formatting::format_duration;
/// assert_eq!(format_duration(125), "2:05");
/// assert_eq!(format_duration(0), "0:00");
/// ```
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Format a percentage value with 1 decimal place.
///
/// # Examples
/// ```
/// use gcdsim_types::formatting::format_pct;
/// assert_eq!(format_pct(42.7), "42.7%");
/// ```
pub fn format_pct(n: f64) -> String {
    format!("{:.1}%", n)
}

/// Format the relative difference of `value` against `baseline` as a signed
/// percentage. Returns `"-"` when the baseline is zero.
///
/// # Examples
/// ```
/// use gcdsim_types::formatting::format_delta_pct;
/// assert_eq!(format_delta_pct(110.0, 100.0), "+10.0%");
/// assert_eq!(format_delta_pct(95.0, 100.0), "-5.0%");
/// assert_eq!(format_delta_pct(5.0, 0.0), "-");
/// ```
pub fn format_delta_pct(value: f64, baseline: f64) -> String {
    if baseline == 0.0 {
        return "-".to_string();
    }
    let delta = (value - baseline) / baseline * 100.0;
    format!("{:+.1}%", delta)
}
