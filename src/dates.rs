//! Dutch free-text market dates ("zaterdag 15 september", "16 & 17 augustus 2025").

use std::cmp::Ordering;

use chrono::{Datelike, Duration, NaiveDate};

use crate::types::{Market, Month};

/// Words that may sit between the days of a range ("16 & 17", "16 t/m 17").
const RANGE_WORDS: [&str; 5] = ["en", "t", "m", "tot", "met"];

/// Parse a market date. Needs a vocabulary month and a 1–2 digit day; anything
/// else is undated. The day is the first of the numbers directly in front of
/// the month, or the first day-like number anywhere when none precedes it. An
/// explicit four-digit year in the text wins, otherwise januari/februari fall
/// in `season_year + 1` and the rest in `season_year`.
pub fn parse(text: &str, season_year: i32) -> Option<NaiveDate> {
    let lower = text.to_lowercase();
    let month = Month::find_in(&lower)?;
    let month_at = lower.find(month.as_str())?;

    let day = day_before(&lower[..month_at]).or_else(|| tokens(&lower).find(|t| is_day(t)))?;
    let explicit_year = tokens(&lower)
        .find(|t| t.len() == 4 && is_number(t))
        .and_then(|t| t.parse::<i32>().ok());

    let year = explicit_year.unwrap_or(if month.rolls_over() {
        season_year + 1
    } else {
        season_year
    });
    NaiveDate::from_ymd_opt(year, month.number(), day.parse().ok()?)
}

fn tokens(text: &str) -> impl DoubleEndedIterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphanumeric()).filter(|t| !t.is_empty())
}

fn is_number(token: &str) -> bool {
    token.bytes().all(|b| b.is_ascii_digit())
}

fn is_day(token: &str) -> bool {
    matches!(token.len(), 1 | 2) && is_number(token)
}

/// Walks back from the month over a run of days and range words.
fn day_before(prefix: &str) -> Option<&str> {
    let mut day = None;
    for token in tokens(prefix).rev() {
        if is_day(token) {
            day = Some(token);
        } else if !RANGE_WORDS.contains(&token) {
            break;
        }
    }
    day
}

/// Upcoming (on or after `today`) ascending, then past ascending, then undated
/// by title. Ties keep their input order.
pub fn sort_by_date(markets: &mut [&Market], today: NaiveDate) {
    markets.sort_by(|a, b| date_order(a.date_value, &a.title, b.date_value, &b.title, today));
}

pub fn date_order(
    a: Option<NaiveDate>,
    a_title: &str,
    b: Option<NaiveDate>,
    b_title: &str,
    today: NaiveDate,
) -> Ordering {
    let rank = |d: Option<NaiveDate>| match d {
        Some(d) if d >= today => 0,
        Some(_) => 1,
        None => 2,
    };
    rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a_title
            .to_lowercase()
            .cmp(&b_title.to_lowercase())
            .then_with(|| a_title.cmp(b_title)),
    })
}

/// True when `date` falls in the Monday–Sunday week containing `today`.
pub fn is_this_week(date: NaiveDate, today: NaiveDate) -> bool {
    // Sunday counts as day 0 and belongs to the week that started six days earlier.
    let from_sunday = today.weekday().num_days_from_sunday() as i64;
    let since_monday = if from_sunday == 0 { 6 } else { from_sunday - 1 };
    let monday = today - Duration::days(since_monday);
    let sunday = monday + Duration::days(6);
    date >= monday && date <= sunday
}
