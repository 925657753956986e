use chrono::{Datelike, Duration, NaiveDate};

/// Rewrites Chinese relative date words in a search query to absolute
/// dates, so that "今天金价" searches for the actual calendar date.
/// Longer words are substituted first ("大前天" before "前天").
pub fn resolve_relative_dates(query: &str, today: NaiveDate) -> String {
    let day_words = [
        ("大前天", today - Duration::days(3)),
        ("大后天", today + Duration::days(3)),
        ("前天", today - Duration::days(2)),
        ("昨天", today - Duration::days(1)),
        ("今天", today),
        ("明天", today + Duration::days(1)),
        ("后天", today + Duration::days(2)),
    ];
    let year_words = [
        ("去年", today.year() - 1),
        ("今年", today.year()),
        ("明年", today.year() + 1),
    ];

    let mut resolved = query.to_string();
    for (word, date) in day_words {
        if resolved.contains(word) {
            resolved = resolved.replace(word, &format_date(date));
        }
    }
    for (word, year) in year_words {
        if resolved.contains(word) {
            resolved = resolved.replace(word, &format!("{year}年"));
        }
    }
    resolved
}

fn format_date(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}
