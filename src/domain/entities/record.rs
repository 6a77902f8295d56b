use std::fmt;

use super::capability::{HONORS, SIGNED_UP};

/// Fixed suspension length applied by the third strike (24 hours)
pub const SUSPENSION_MS: i64 = 24 * 60 * 60 * 1000;

/// Strike count at which a member is suspended
pub const STRIKE_LIMIT: u32 = 3;

const FIELD_DELIMITER: char = '|';
const COURSE_DELIMITER: char = ',';

/// Moderation status derived from `unban_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Active,
    Suspended { until: i64 },
}

/// Disciplinary record of one member within one scope
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModerationRecord {
    pub id: String,
    pub strikes: u32,
    /// Epoch milliseconds, `0` when not suspended
    pub unban_at: i64,
    pub courses: Vec<String>,
    /// The "ib" attribute
    pub honors: bool,
}

impl ModerationRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_courses(mut self, courses: Vec<String>) -> Self {
        self.courses = courses;
        self
    }

    pub fn with_honors(mut self, honors: bool) -> Self {
        self.honors = honors;
        self
    }

    pub fn standing(&self) -> Standing {
        if self.unban_at == 0 {
            Standing::Active
        } else {
            Standing::Suspended { until: self.unban_at }
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.unban_at != 0
    }

    /// Suspended with a deadline strictly before `now`
    pub fn suspension_expired(&self, now: i64) -> bool {
        self.unban_at != 0 && self.unban_at < now
    }

    /// Capability names an Active member with this record should hold
    pub fn desired_capabilities(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .courses
            .iter()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect();
        if self.honors {
            names.push(HONORS.to_string());
        }
        names.push(SIGNED_UP.to_string());
        names
    }

    /// Check that the record can be written without breaking the line format
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("empty member id".to_string());
        }
        if self.id.contains([FIELD_DELIMITER, '\n', '\r']) {
            return Err(format!("member id {:?} contains a reserved character", self.id));
        }
        if self.unban_at < 0 {
            return Err(format!("negative unban deadline {}", self.unban_at));
        }
        for course in &self.courses {
            if course.is_empty() || course.contains([FIELD_DELIMITER, COURSE_DELIMITER, '\n', '\r']) {
                return Err(format!("invalid course name {:?}", course));
            }
        }
        Ok(())
    }

    /// Serialize as a single line, without the trailing newline
    pub fn to_line(&self) -> String {
        format!(
            "{id}{d}{strikes}{d}{unban}{d}{honors}{d}{courses}",
            id = self.id,
            strikes = self.strikes,
            unban = self.unban_at,
            honors = if self.honors { "1" } else { "0" },
            courses = self.courses.join(","),
            d = FIELD_DELIMITER,
        )
    }

    /// Parse one persisted line.
    ///
    /// Only the canonical form produced by [`ModerationRecord::to_line`] is
    /// accepted, so parsing then serializing reproduces the line exactly.
    pub fn from_line(line: &str) -> Result<Self, String> {
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        let [id, strikes, unban_at, honors, courses] = fields.as_slice() else {
            return Err(format!("expected 5 fields, found {}", fields.len()));
        };

        let strikes: u32 = parse_canonical(strikes, "strikes")?;
        let unban_at: i64 = parse_canonical(unban_at, "unban deadline")?;
        let honors = match *honors {
            "0" => false,
            "1" => true,
            other => return Err(format!("invalid honors flag {:?}", other)),
        };
        let courses = if courses.is_empty() {
            Vec::new()
        } else {
            courses.split(COURSE_DELIMITER).map(str::to_string).collect()
        };

        let record = Self {
            id: id.to_string(),
            strikes,
            unban_at,
            courses,
            honors,
        };
        record.validate()?;
        Ok(record)
    }
}

fn parse_canonical<T>(raw: &str, field: &str) -> Result<T, String>
where
    T: std::str::FromStr + ToString,
{
    let value: T = raw
        .parse()
        .map_err(|_| format!("invalid {} {:?}", field, raw))?;
    if value.to_string() != raw {
        return Err(format!("non-canonical {} {:?}", field, raw));
    }
    Ok(value)
}

impl fmt::Display for ModerationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} strike(s)", self.id, self.strikes)?;
        if let Standing::Suspended { until } = self.standing() {
            match chrono::DateTime::from_timestamp_millis(until) {
                Some(at) => write!(f, ", suspended until {}", at.format("%Y-%m-%d %H:%M UTC"))?,
                None => write!(f, ", suspended until {}", until)?,
            }
        }
        if !self.courses.is_empty() {
            write!(f, ", courses [{}]", self.courses.join(", "))?;
        }
        if self.honors {
            write!(f, ", ib")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        let record = ModerationRecord::new("1234")
            .with_courses(vec!["math-hl".to_string(), "physics-sl".to_string()])
            .with_honors(true);
        assert_eq!(record.to_line(), "1234|0|0|1|math-hl,physics-sl");
        assert_eq!(ModerationRecord::new("U1").to_line(), "U1|0|0|0|");
    }

    #[test]
    fn test_round_trip() {
        let records = vec![
            ModerationRecord::new("a"),
            ModerationRecord {
                id: "b".to_string(),
                strikes: 7,
                unban_at: 1_700_000_000_000,
                courses: vec!["chem-sl".to_string()],
                honors: false,
            },
            ModerationRecord {
                id: "c".to_string(),
                strikes: 3,
                unban_at: 1,
                courses: vec!["x-sl".into(), "y-hl".into(), "z-sl".into()],
                honors: true,
            },
        ];
        for record in records {
            let line = record.to_line();
            let parsed = ModerationRecord::from_line(&line).unwrap();
            assert_eq!(parsed, record);
            assert_eq!(parsed.to_line(), line);
        }
    }

    #[test]
    fn test_rejects_non_canonical_lines() {
        assert!(ModerationRecord::from_line("u|01|0|0|").is_err());
        assert!(ModerationRecord::from_line("u|1|-5|0|").is_err());
        assert!(ModerationRecord::from_line("u|1|0|2|").is_err());
        assert!(ModerationRecord::from_line("u|1|0|0|a,,b").is_err());
        assert!(ModerationRecord::from_line("u|1|0|0").is_err());
        assert!(ModerationRecord::from_line("|1|0|0|").is_err());
    }

    #[test]
    fn test_standing() {
        let mut record = ModerationRecord::new("u");
        assert_eq!(record.standing(), Standing::Active);
        record.unban_at = 500;
        assert_eq!(record.standing(), Standing::Suspended { until: 500 });
        assert!(record.suspension_expired(501));
        assert!(!record.suspension_expired(500));
    }

    #[test]
    fn test_desired_capabilities() {
        let record = ModerationRecord::new("u")
            .with_courses(vec!["bio-sl".to_string()])
            .with_honors(true);
        assert_eq!(record.desired_capabilities(), vec!["bio-sl", "ib", "signed-up"]);
        assert_eq!(ModerationRecord::new("v").desired_capabilities(), vec!["signed-up"]);
    }

    #[test]
    fn test_validate() {
        assert!(ModerationRecord::new("a|b").validate().is_err());
        assert!(ModerationRecord::new("ok")
            .with_courses(vec!["a,b".to_string()])
            .validate()
            .is_err());
        assert!(ModerationRecord::new("ok").validate().is_ok());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn any_record() -> impl Strategy<Value = ModerationRecord> {
        (
            "[^|\r\n]{1,20}",
            any::<u32>(),
            0..=i64::MAX,
            prop::collection::vec("[^|,\r\n]{1,12}", 0..5),
            any::<bool>(),
        )
            .prop_map(|(id, strikes, unban_at, courses, honors)| ModerationRecord {
                id,
                strikes,
                unban_at,
                courses,
                honors,
            })
    }

    proptest! {
        #[test]
        fn line_round_trip_is_exact(record in any_record()) {
            let line = record.to_line();
            let parsed = ModerationRecord::from_line(&line).unwrap();
            prop_assert_eq!(&parsed, &record);
            prop_assert_eq!(parsed.to_line(), line);
        }

        #[test]
        fn accepted_lines_reserialize_unchanged(line in "[0-9a-z|,+-]{0,30}") {
            if let Ok(record) = ModerationRecord::from_line(&line) {
                prop_assert_eq!(record.to_line(), line);
            }
        }
    }
}
