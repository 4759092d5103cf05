use chrono::{DateTime, Datelike, TimeZone};
use guestbook_common::message::PostedMessage;

const PREMIUM_MARKER: &str = "★";

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Renders a timestamp as e.g. `March 3rd 2021, 4:05:06 pm`.
pub fn format_signed_date<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let day = at.day();
    format!(
        "{} {day}{} {}",
        at.format("%B"),
        ordinal_suffix(day),
        at.format("%Y, %-I:%M:%S %P"),
    )
}

/// One guest book entry: sender, text and signing time, with premium
/// entries marked.
pub fn render_message<Tz: TimeZone>(message: &PostedMessage, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let signed = format_signed_date(&message.signed_at().with_timezone(tz));
    let marker = if message.premium {
        format!("{PREMIUM_MARKER} ")
    } else {
        String::new()
    };
    format!("{marker}{}: {}\n    {signed}", message.sender, message.text)
}
