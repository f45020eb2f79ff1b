use time::format_description;
use time::parsing::Parsed;

/// Normalize a free-form date tag into a sortable `YYYY`, `YYYY-MM` or
/// `YYYY-MM-DD` string.
///
/// `templates` are `time` format descriptions (for example
/// `"[year]-[month]-[day]"`), tried in order; the first one that consumes
/// the whole input wins. Input that matches no template yields `None`;
/// malformed dates never fail hard.
pub fn normalize_date(raw: &str, templates: &[String]) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for template in templates {
        let Ok(items) = format_description::parse(template) else {
            continue;
        };

        let mut parsed = Parsed::new();
        let Ok(rest) = parsed.parse_items(raw.as_bytes(), &items) else {
            continue;
        };
        if !rest.is_empty() {
            continue;
        }
        let Some(year) = parsed.year() else {
            continue;
        };

        let mut out = format!("{year:04}");
        if let Some(month) = parsed.month() {
            out.push_str(&format!("-{:02}", u8::from(month)));
            if let Some(day) = parsed.day() {
                out.push_str(&format!("-{:02}", day.get()));
            }
        }
        return Some(out);
    }

    None
}

/// Year of a normalized date string produced by [`normalize_date`].
pub fn year_of(date: &str) -> Option<i32> {
    let year = date.split('-').next()?;
    year.parse().ok()
}
