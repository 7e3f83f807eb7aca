use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::category::guess_category;
use super::clean::clean;
use super::ident::{slugify, IdRegistry};
use crate::store::Record;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(1[0-9]{3}|20[0-2][0-9])\b").unwrap());

const HEADER_WORDS: &[&str] = &["date", "year", "century", "event", "prediction"];
const LOW_INFO_OUTCOMES: &[&str] = &["no", "yes", "none", "n/a", "—", "-"];
const MIN_CELLS: usize = 3;
const MIN_PREDICTION_CHARS: usize = 15;
const MIN_REALITY_CHARS: usize = 20;
const FIRST_FUTURE_YEAR: i32 = 2026;
const UNKNOWN_SOURCE: &str = "Unknown";

/// Why a row was not turned into a record. Expected for most rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    TooFewCells(usize),
    HeaderRow,
    EmptyLead,
    NoYear,
    FutureYear(i32),
    ShortPrediction,
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::TooFewCells(_) => "too_few_cells",
            Rejection::HeaderRow => "header_row",
            Rejection::EmptyLead => "empty_lead",
            Rejection::NoYear => "no_year",
            Rejection::FutureYear(_) => "future_year",
            Rejection::ShortPrediction => "short_prediction",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooFewCells(n) => write!(f, "only {} cell(s)", n),
            Rejection::HeaderRow => f.write_str("header row"),
            Rejection::EmptyLead => f.write_str("first cell empty"),
            Rejection::NoYear => f.write_str("no year in first cell"),
            Rejection::FutureYear(y) => write!(f, "year {} not in the past", y),
            Rejection::ShortPrediction => f.write_str("prediction too short"),
        }
    }
}

/// Turn one table row into a record, or say why not.
///
/// `known` is consulted for id collisions but not modified; the caller
/// reserves the id once it keeps the record.
pub fn classify_row(row: &[String], hint: &str, known: &IdRegistry) -> Result<Record, Rejection> {
    if row.len() < MIN_CELLS {
        return Err(Rejection::TooFewCells(row.len()));
    }

    let cells: Vec<String> = row.iter().map(|c| clean(c)).collect();

    let lead = cells[0].to_lowercase();
    if HEADER_WORDS.iter().any(|w| lead.contains(w)) {
        return Err(Rejection::HeaderRow);
    }
    if cells[0].is_empty() {
        return Err(Rejection::EmptyLead);
    }

    let year: i32 = YEAR_RE
        .captures(&cells[0])
        .and_then(|caps| caps[1].parse().ok())
        .ok_or(Rejection::NoYear)?;
    if year >= FIRST_FUTURE_YEAR {
        return Err(Rejection::FutureYear(year));
    }

    // Shape A: when | who | what | outcome. Shape B: when | what | outcome.
    let (claimant, prediction, outcome) = if cells.len() >= 4 {
        (&cells[1], &cells[2], &cells[3])
    } else {
        (&cells[1], &cells[1], &cells[2])
    };

    if char_len(prediction) < MIN_PREDICTION_CHARS {
        return Err(Rejection::ShortPrediction);
    }

    let prefix: String = prediction.chars().take(20).collect();
    let id = known.resolve(&slugify(&format!("{}-{}", claimant, prefix), year));

    let category = guess_category(&format!("{} {} {}", prediction, outcome, hint));

    let source = if !claimant.is_empty() && claimant != prediction {
        claimant.clone()
    } else {
        UNKNOWN_SOURCE.to_string()
    };

    Ok(Record::harvested(
        id,
        year,
        prediction.clone(),
        source,
        reality_for(outcome, year),
        category,
    ))
}

fn reality_for(outcome: &str, year: i32) -> String {
    let substantive = char_len(outcome) > MIN_REALITY_CHARS
        && !LOW_INFO_OUTCOMES.contains(&outcome.to_lowercase().as_str());
    if substantive {
        outcome.to_string()
    } else {
        format!(
            "The predicted event did not occur as described by {}.",
            fallback_year(year)
        )
    }
}

fn fallback_year(year: i32) -> i32 {
    if year < 2020 {
        year + 5
    } else {
        2025
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
