//! Score classification and per-student aggregation.
//!
//! Everything here is pure: callers load grade rows from the store and hand
//! the scores in, in creation order.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of leading scores that count towards a student's overall grade.
pub const OVERALL_GRADE_WINDOW: usize = 7;

/// Letter grade bucket for a score in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    E,
}

impl LetterGrade {
    /// Map a score onto its bucket. `None` means the score is invalid.
    ///
    /// The D and E ranges both claim 40; E takes it.
    pub fn classify(score: i64) -> Option<Self> {
        match score {
            80..=100 => Some(Self::A),
            60..=79 => Some(Self::B),
            49..=59 => Some(Self::C),
            41..=48 => Some(Self::D),
            0..=40 => Some(Self::E),
            _ => None,
        }
    }

    /// Ranking weight used when ordering a roster, A highest.
    pub fn rank(self) -> u8 {
        match self {
            Self::A => 5,
            Self::B => 4,
            Self::C => 3,
            Self::D => 2,
            Self::E => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGrade(pub String);

impl fmt::Display for UnknownGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown letter grade '{}'", self.0)
    }
}

impl std::error::Error for UnknownGrade {}

impl FromStr for LetterGrade {
    type Err = UnknownGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            other => Err(UnknownGrade(other.to_string())),
        }
    }
}

/// Coerce a loosely-typed JSON value to an integer score.
///
/// Integers pass through, fractional numbers truncate toward zero and strings
/// must hold a base-10 integer. Anything else fails.
pub fn coerce_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Classify a raw request value, returning the coerced score with its grade.
/// `None` means invalid.
pub fn classify_value(value: &Value) -> Option<(i64, LetterGrade)> {
    let score = coerce_score(value)?;
    LetterGrade::classify(score).map(|grade| (score, grade))
}

/// Roster weight of a possibly-unrecognized grade; anything unknown ranks 1.
pub fn grade_rank(grade: Option<LetterGrade>) -> u8 {
    grade.map_or(1, LetterGrade::rank)
}

/// Overall grade from scores in creation order.
///
/// Averages at most the first [`OVERALL_GRADE_WINDOW`] scores, truncating
/// the mean to an integer before classifying. No scores yields E.
pub fn overall_grade(scores: &[i64]) -> Option<LetterGrade> {
    let window = &scores[..scores.len().min(OVERALL_GRADE_WINDOW)];
    if window.is_empty() {
        return Some(LetterGrade::E);
    }

    let total: i64 = window.iter().sum();
    LetterGrade::classify(total / window.len() as i64)
}

/// Sort items descending by grade rank. Ties keep their input order.
pub fn rank_by_grade<T, F>(items: &mut [T], grade_of: F)
where
    F: Fn(&T) -> Option<LetterGrade>,
{
    items.sort_by_key(|item| Reverse(grade_rank(grade_of(item))));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAverage {
    pub subject: String,
    pub avg_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendStats {
    pub average_score: f64,
    /// One entry per distinct subject, in first-seen order.
    pub subject_averages: Vec<SubjectAverage>,
}

/// Overall and per-subject averages over `(subject, score)` pairs.
pub fn trend_stats<'a, I>(grades: I) -> TrendStats
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut total: i64 = 0;
    let mut count: usize = 0;
    let mut slots: HashMap<&'a str, usize> = HashMap::new();
    let mut per_subject: Vec<(&'a str, i64, usize)> = Vec::new();

    for (subject, score) in grades {
        total += score;
        count += 1;

        let idx = *slots.entry(subject).or_insert_with(|| {
            per_subject.push((subject, 0, 0));
            per_subject.len() - 1
        });
        let slot = &mut per_subject[idx];
        slot.1 += score;
        slot.2 += 1;
    }

    let average_score = if count > 0 {
        total as f64 / count as f64
    } else {
        0.0
    };

    let subject_averages = per_subject
        .into_iter()
        .map(|(subject, sum, n)| SubjectAverage {
            subject: subject.to_string(),
            avg_score: sum as f64 / n as f64,
        })
        .collect();

    TrendStats {
        average_score,
        subject_averages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(LetterGrade::classify(100), Some(LetterGrade::A));
        assert_eq!(LetterGrade::classify(80), Some(LetterGrade::A));
        assert_eq!(LetterGrade::classify(79), Some(LetterGrade::B));
        assert_eq!(LetterGrade::classify(60), Some(LetterGrade::B));
        assert_eq!(LetterGrade::classify(59), Some(LetterGrade::C));
        assert_eq!(LetterGrade::classify(49), Some(LetterGrade::C));
        assert_eq!(LetterGrade::classify(48), Some(LetterGrade::D));
        assert_eq!(LetterGrade::classify(41), Some(LetterGrade::D));
        assert_eq!(LetterGrade::classify(40), Some(LetterGrade::E));
        assert_eq!(LetterGrade::classify(0), Some(LetterGrade::E));
        assert_eq!(LetterGrade::classify(101), None);
        assert_eq!(LetterGrade::classify(-5), None);
    }

    #[test]
    fn test_classify_every_score_in_range() {
        for score in 0..=100 {
            assert!(LetterGrade::classify(score).is_some(), "score {score}");
        }
    }

    #[test]
    fn test_classify_value_coercion() {
        assert_eq!(classify_value(&json!(85)), Some((85, LetterGrade::A)));
        assert_eq!(classify_value(&json!("72")), Some((72, LetterGrade::B)));
        assert_eq!(classify_value(&json!(" 55 ")), Some((55, LetterGrade::C)));
        assert_eq!(classify_value(&json!(79.9)), Some((79, LetterGrade::B)));
        assert_eq!(classify_value(&json!(-1)), None);
        assert_eq!(classify_value(&json!(101)), None);
        assert_eq!(classify_value(&json!("abc")), None);
        assert_eq!(classify_value(&json!("79.5")), None);
        assert_eq!(classify_value(&json!(null)), None);
        assert_eq!(classify_value(&json!(true)), None);
        assert_eq!(classify_value(&json!([90])), None);
    }

    #[test]
    fn test_overall_grade_defaults_to_e() {
        assert_eq!(overall_grade(&[]), Some(LetterGrade::E));
    }

    #[test]
    fn test_overall_grade_uses_first_seven() {
        // Mean of the first seven is 90; the eighth would drag it to 78.
        let scores = [90, 90, 90, 90, 90, 90, 90, 0];
        assert_eq!(overall_grade(&scores), Some(LetterGrade::A));
    }

    #[test]
    fn test_overall_grade_truncates_mean() {
        // 159 / 2 = 79.5 -> 79
        assert_eq!(overall_grade(&[80, 79]), Some(LetterGrade::B));
    }

    #[test]
    fn test_rank_by_grade() {
        use LetterGrade::*;
        let mut roster = vec![("s1", E), ("s2", A), ("s3", C), ("s4", A), ("s5", B)];
        rank_by_grade(&mut roster, |(_, g)| Some(*g));
        let grades: Vec<LetterGrade> = roster.iter().map(|(_, g)| *g).collect();
        assert_eq!(grades, vec![A, A, B, C, E]);
    }

    #[test]
    fn test_unrecognized_grade_ranks_lowest() {
        let mut roster = vec![None, Some(LetterGrade::D), Some(LetterGrade::E)];
        rank_by_grade(&mut roster, |g| *g);
        assert_eq!(roster[0], Some(LetterGrade::D));
        assert_eq!(grade_rank(None), grade_rank(Some(LetterGrade::E)));
    }

    #[test]
    fn test_trend_stats() {
        let stats = trend_stats([("Math", 70), ("Math", 80), ("Sci", 90)]);
        assert_eq!(stats.average_score, 80.0);
        assert_eq!(
            stats.subject_averages,
            vec![
                SubjectAverage { subject: "Math".into(), avg_score: 75.0 },
                SubjectAverage { subject: "Sci".into(), avg_score: 90.0 },
            ]
        );
    }

    #[test]
    fn test_trend_stats_empty() {
        let stats = trend_stats(std::iter::empty());
        assert_eq!(stats.average_score, 0.0);
        assert!(stats.subject_averages.is_empty());
    }

    #[test]
    fn test_letter_grade_round_trip_str() {
        assert_eq!("C".parse::<LetterGrade>(), Ok(LetterGrade::C));
        assert!("invalid".parse::<LetterGrade>().is_err());
    }
}
