use chrono::{DateTime, Local, TimeZone};

pub const DEFAULT_CLOCK_FORMAT: &str = "%H:%M:%S";

/// Wall clock shown in the header, refreshed once a second
#[derive(Debug, Clone)]
pub struct Clock {
    format: String,
    display: String,
}

impl Clock {
    pub fn new(format: &str) -> Self {
        let mut clock = Self {
            format: format.to_string(),
            display: String::new(),
        };
        clock.update();
        clock
    }

    pub fn update(&mut self) {
        self.display = Self::render(&Local::now(), &self.format);
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn render<Tz: TimeZone>(time: &DateTime<Tz>, format: &str) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        use std::fmt::Write;

        // An invalid strftime string makes `Display` fail instead of panicking
        let mut out = String::new();
        if write!(out, "{}", time.format(format)).is_err() {
            out.clear();
            let _ = write!(out, "{}", time.format(DEFAULT_CLOCK_FORMAT));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_render_default_format() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 9, 3, 7).unwrap();
        assert_eq!(Clock::render(&t, DEFAULT_CLOCK_FORMAT), "09:03:07");
        assert_eq!(Clock::render(&t, "%Y-%m-%d %H:%M"), "2024-05-01 09:03");
    }

    #[test]
    fn test_invalid_format_falls_back() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 0).unwrap();
        assert_eq!(Clock::render(&t, "%Q"), "23:59:00");
    }

    #[test]
    fn test_clock_has_display_after_new() {
        let clock = Clock::new(DEFAULT_CLOCK_FORMAT);
        assert_eq!(clock.display().len(), 8);
    }
}
