//! timezone.rs
//!
//! Нормализация календарных дат относительно фиксированного часового пояса
//! площадки.
//!
//! Сервер может работать в любом поясе, поэтому «какой это день» определяется
//! только здесь: каждая дата приводится к каноническому моменту - полуночи
//! этого дня в поясе площадки, выраженной в UTC. Все ключи хранения и
//! проверки конфликтов считаются от этого момента, а не от локальных часов.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::errors::{ApiError, ApiResult};

const API_DATE_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_DATE_FORMAT: &str = "%d %b %Y";

/// Календарная дата момента `instant` в поясе площадки, в виде `YYYY-MM-DD`.
pub fn format_for_api(tz: Tz, instant: DateTime<Utc>) -> String {
    instant.with_timezone(&tz).format(API_DATE_FORMAT).to_string()
}

/// Разбирает строку с датой (`YYYY-MM-DD` или RFC 3339) и возвращает
/// канонический момент: полночь соответствующего календарного дня в поясе
/// площадки. Смещение пояса берется на конкретную дату, а не константой.
pub fn parse_to_canonical_instant(tz: Tz, input: &str) -> ApiResult<DateTime<Utc>> {
    let instant =
        parse_flexible(tz, input).ok_or_else(|| ApiError::InvalidDate(input.to_string()))?;
    canonical_day(tz, instant)
}

/// Канонический момент для уже разобранного момента времени.
pub fn canonical_day(tz: Tz, instant: DateTime<Utc>) -> ApiResult<DateTime<Utc>> {
    let day = instant.with_timezone(&tz).date_naive();
    zone_midnight(tz, day).ok_or_else(|| ApiError::InvalidDate(format_for_api(tz, instant)))
}

/// Последовательность канонических моментов всех дней из отрезка
/// `[start, end]` включительно, шаг - один календарный день пояса площадки.
pub fn enumerate_days(tz: Tz, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut days = Vec::new();
    let mut day = start.with_timezone(&tz).date_naive();
    let last = end.with_timezone(&tz).date_naive();

    while day <= last {
        if let Some(instant) = zone_midnight(tz, day) {
            days.push(instant);
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    days
}

/// Человекочитаемая дата в поясе площадки. Для нечитаемого входа возвращает
/// пустую строку: отображение даты не должно ронять страницу.
pub fn format_for_display(tz: Tz, input: &str, pattern: Option<&str>) -> String {
    let pattern = pattern.unwrap_or(DISPLAY_DATE_FORMAT);
    match parse_flexible(tz, input) {
        Some(instant) => instant.with_timezone(&tz).format(pattern).to_string(),
        None => String::new(),
    }
}

// Дата без времени трактуется как календарный день пояса площадки,
// RFC 3339 - как абсолютный момент.
fn parse_flexible(tz: Tz, input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(day) = NaiveDate::parse_from_str(input, API_DATE_FORMAT) {
        return zone_midnight(tz, day);
    }
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

// Полночь может попасть в «дыру» перевода часов; тогда берется самый ранний
// существующий момент этого дня. Из двух неоднозначных полуночей - ранняя.
fn zone_midnight(tz: Tz, day: NaiveDate) -> Option<DateTime<Utc>> {
    let mut local = day.and_time(NaiveTime::MIN);
    for _ in 0..48 {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(instant) => return Some(instant.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Some(earliest.with_timezone(&Utc)),
            LocalResult::None => local += Duration::minutes(30),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Santiago;
    use chrono_tz::Asia::Bangkok;
    use proptest::prelude::*;

    #[test]
    fn parses_plain_date_to_zone_midnight() {
        let instant = parse_to_canonical_instant(Bangkok, "2024-01-15").unwrap();
        // Полночь Бангкока (UTC+7) - это 17:00 предыдущего дня по UTC
        assert_eq!(instant.to_rfc3339(), "2024-01-14T17:00:00+00:00");
    }

    #[test]
    fn parses_rfc3339_instant_by_zone_calendar_day() {
        // 23:30 UTC - это уже 06:30 следующего дня в Бангкоке
        let instant = parse_to_canonical_instant(Bangkok, "2024-01-15T23:30:00Z").unwrap();
        assert_eq!(format_for_api(Bangkok, instant), "2024-01-16");
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_to_canonical_instant(Bangkok, "not-a-date").unwrap_err();
        assert!(matches!(err, ApiError::InvalidDate(_)));
        assert!(parse_to_canonical_instant(Bangkok, "2024-13-40").is_err());
        assert!(parse_to_canonical_instant(Bangkok, "").is_err());
    }

    #[test]
    fn api_format_follows_zone_day_boundary() {
        let before = "2024-01-15T16:59:59Z".parse::<DateTime<Utc>>().unwrap();
        let after = "2024-01-15T17:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(format_for_api(Bangkok, before), "2024-01-15");
        assert_eq!(format_for_api(Bangkok, after), "2024-01-16");
    }

    #[test]
    fn midnight_inside_dst_gap_resolves_to_earliest_instant() {
        // В Чили 2024-09-08 часы переводятся вперед ровно в полночь:
        // 00:00 этого дня не существует, самый ранний момент - 01:00 (-03)
        let instant = parse_to_canonical_instant(Santiago, "2024-09-08").unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-09-08T04:00:00+00:00");
        assert_eq!(format_for_api(Santiago, instant), "2024-09-08");
    }

    #[test]
    fn enumerates_inclusive_day_sequence_across_month_end() {
        let start = parse_to_canonical_instant(Bangkok, "2024-01-30").unwrap();
        let end = parse_to_canonical_instant(Bangkok, "2024-02-02").unwrap();
        let days: Vec<String> = enumerate_days(Bangkok, start, end)
            .into_iter()
            .map(|d| format_for_api(Bangkok, d))
            .collect();
        assert_eq!(days, ["2024-01-30", "2024-01-31", "2024-02-01", "2024-02-02"]);
    }

    #[test]
    fn enumerates_single_day_when_bounds_match() {
        let day = parse_to_canonical_instant(Bangkok, "2024-06-01").unwrap();
        assert_eq!(enumerate_days(Bangkok, day, day), vec![day]);
    }

    #[test]
    fn display_formats_in_zone() {
        assert_eq!(
            format_for_display(Bangkok, "2024-01-15", None),
            "15 Jan 2024"
        );
        assert_eq!(
            format_for_display(Bangkok, "2024-01-15T23:30:00Z", Some("%Y-%m-%d %H:%M")),
            "2024-01-16 06:30"
        );
    }

    #[test]
    fn display_never_fails_on_garbage() {
        assert_eq!(format_for_display(Bangkok, "garbage", None), "");
        assert_eq!(format_for_display(Bangkok, "", None), "");
    }

    proptest! {
        // parse ∘ format_for_api ∘ parse ≡ parse: нормализация идемпотентна
        #[test]
        fn canonical_round_trip_is_idempotent(
            year in 1970i32..2100,
            month in 1u32..=12,
            day in 1u32..=31,
        ) {
            prop_assume!(NaiveDate::from_ymd_opt(year, month, day).is_some());
            let input = format!("{year:04}-{month:02}-{day:02}");

            let first = parse_to_canonical_instant(Bangkok, &input).unwrap();
            let second =
                parse_to_canonical_instant(Bangkok, &format_for_api(Bangkok, first)).unwrap();

            prop_assert_eq!(first, second);
        }
    }
}
