use crate::config::SchedulingPolicy;
use crate::error::SchedulingError;

/// Parses a time string (HH:MM) to minutes since midnight
pub fn time_to_minutes(time_str: &str) -> Result<u32, SchedulingError> {
    parse_time_to_minutes(time_str).ok_or_else(|| SchedulingError::InvalidTime(time_str.to_string()))
}

/// Same as `time_to_minutes` but without the error payload
pub fn parse_time_to_minutes(time_str: &str) -> Option<u32> {
    let (hours, minutes) = time_str.trim().split_once(':')?;
    if hours.is_empty() || minutes.len() != 2 {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Formats minutes since midnight to time string (HH:MM)
///
/// Not wrapped at midnight: a plan running past the end of the day reads
/// "24:30" rather than jumping back to "00:30".
pub fn minutes_to_time(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Half-open interval overlap: [a0, a1) and [b0, b1)
pub fn overlaps(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    a_start < b_end && b_start < a_end
}

/// Integer ceil(n / d); zero divisor yields zero
pub fn div_ceil(n: usize, d: usize) -> usize {
    if d == 0 {
        return 0;
    }
    n.div_ceil(d)
}

/// Candidate start times probed when suggesting alternatives, in order
pub fn probe_times(policy: &SchedulingPolicy) -> Vec<u32> {
    let start = parse_time_to_minutes(&policy.probe_start).unwrap_or(9 * 60);
    let end = parse_time_to_minutes(&policy.probe_end).unwrap_or(17 * 60);
    let step = policy.probe_step_minutes.max(1) as usize;

    (start..=end).step_by(step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_times() {
        assert_eq!(parse_time_to_minutes("00:00"), Some(0));
        assert_eq!(parse_time_to_minutes("09:05"), Some(545));
        assert_eq!(parse_time_to_minutes("23:59"), Some(1439));
        assert_eq!(parse_time_to_minutes(" 10:30 "), Some(630));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "10", "24:00", "10:60", "10:5", "ab:cd", "10:30:00", ":30", "-1:30"] {
            assert_eq!(parse_time_to_minutes(bad), None, "{bad} should be rejected");
        }
        assert!(matches!(time_to_minutes("25:00"), Err(SchedulingError::InvalidTime(t)) if t == "25:00"));
    }

    #[test]
    fn test_round_trip_every_minute_of_the_day() {
        for minutes in 0..24 * 60 {
            let time = minutes_to_time(minutes);
            assert_eq!(time_to_minutes(&time).unwrap(), minutes);
            assert_eq!(minutes_to_time(time_to_minutes(&time).unwrap()), time);
        }
    }

    #[test]
    fn test_minutes_past_midnight_not_wrapped() {
        assert_eq!(minutes_to_time(1470), "24:30");
    }

    #[test]
    fn test_overlap_is_half_open() {
        assert!(overlaps(600, 660, 630, 690));
        assert!(overlaps(600, 660, 600, 660));
        assert!(!overlaps(600, 660, 660, 720));
        assert!(!overlaps(660, 720, 600, 660));
    }

    #[test]
    fn test_probe_times_hourly_nine_to_five() {
        let times: Vec<String> = probe_times(&SchedulingPolicy::default())
            .into_iter()
            .map(minutes_to_time)
            .collect();
        assert_eq!(
            times,
            vec!["09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00"]
        );
    }

    #[test]
    fn test_div_ceil() {
        assert_eq!(div_ceil(4, 2), 2);
        assert_eq!(div_ceil(5, 2), 3);
        assert_eq!(div_ceil(0, 3), 0);
        assert_eq!(div_ceil(3, 0), 0);
    }
}
