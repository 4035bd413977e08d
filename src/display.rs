use std::fmt;
use std::fs::File;
use std::io::Write;

use crate::schedule::types::{CapacityCheck, CapacityStatus, MemberAssignment, SchedulingRecommendation};

/// Formats a staff name with specialty tag
pub fn format_staff_name(name: &str, specialty: Option<&str>) -> String {
    match specialty {
        Some(s) if !s.is_empty() => format!("{} ({})", name, s),
        _ => name.to_string(),
    }
}

impl fmt::Display for MemberAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Guest {}: {}-{} with {}",
            self.member_index + 1,
            self.start_time,
            self.end_time,
            self.staff_name
        )
    }
}

impl fmt::Display for SchedulingRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strategy: {} ({})", self.strategy, self.reason)?;
        writeln!(
            f,
            "Available staff: {}, total duration: {} min, estimated end: {}",
            self.available_staff, self.total_duration, self.estimated_end_time
        )?;
        for assignment in &self.assignments {
            writeln!(f, "  {}", assignment)?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  - {}", warning)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for CapacityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            CapacityStatus::Full => "full capacity",
            CapacityStatus::Partial => "partial capacity",
            CapacityStatus::None => "no capacity",
        };
        writeln!(
            f,
            "{} of {} guests can be served at once: {}",
            self.available_staff.min(self.party_size),
            self.party_size,
            status
        )?;
        if !self.alternatives.is_empty() {
            writeln!(f, "Alternative times:")?;
            for alt in &self.alternatives {
                writeln!(f, "  {} {} ({} staff free)", alt.date, alt.time, alt.available_staff)?;
            }
        }
        Ok(())
    }
}

/// Renders a titled recommendation, one guest per line
pub fn render_recommendation(title: &str, rec: &SchedulingRecommendation) -> String {
    format!("** {} **\n{}", title, rec)
}

pub fn render_capacity(check: &CapacityCheck) -> String {
    check.to_string()
}

/// Prints a recommendation in a readable format
pub fn print_recommendation(title: &str, rec: &SchedulingRecommendation) {
    println!("\n{}", render_recommendation(title, rec));
}

/// Writes a recommendation to a plain text file
pub fn write_recommendation_to_file(
    title: &str,
    rec: &SchedulingRecommendation,
    filename: &str,
) -> Result<(), std::io::Error> {
    let mut file = File::create(filename)?;
    writeln!(file, "** {} **", title)?;
    write!(file, "{}", rec)?;
    Ok(())
}
