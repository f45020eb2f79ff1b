//! Ordering policies for library entities.
//!
//! Each comparer is a pure total order over a pair of same-kind entities,
//! usable with `sort_by` to re-sort a flat collection without touching the
//! tree it came from. Tie-break chains are fixed: date orderings fall back
//! to the title, and an absent date sorts after every present one no matter
//! which direction the sort runs.

use crate::model::{Album, GenreFilteredAlbum, Playable, Song};
use std::cmp::Ordering;

pub fn albums_by_title(a: &Album, b: &Album) -> Ordering {
    a.artist
        .name
        .cmp(&b.artist.name)
        .then_with(|| a.title.cmp(&b.title))
}

pub fn albums_by_date(a: &Album, b: &Album) -> Ordering {
    a.artist
        .name
        .cmp(&b.artist.name)
        .then_with(|| missing_dates_last(a.date.as_deref(), b.date.as_deref()))
        .then_with(|| a.title.cmp(&b.title))
}

pub fn albums_by_directory(a: &Album, b: &Album) -> Ordering {
    a.directory
        .cmp(&b.directory)
        .then_with(|| missing_dates_last(a.date.as_deref(), b.date.as_deref()))
        .then_with(|| a.title.cmp(&b.title))
}

pub fn genre_albums_by_title(a: &GenreFilteredAlbum, b: &GenreFilteredAlbum) -> Ordering {
    a.genre
        .cmp(&b.genre)
        .then_with(|| albums_by_title(&a.album, &b.album))
}

pub fn genre_albums_by_date(a: &GenreFilteredAlbum, b: &GenreFilteredAlbum) -> Ordering {
    a.genre
        .cmp(&b.genre)
        .then_with(|| albums_by_date(&a.album, &b.album))
}

pub fn songs_by_title(a: &Song, b: &Song) -> Ordering {
    a.title().cmp(&b.title()).then_with(|| a.path.cmp(&b.path))
}

fn missing_dates_last(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
