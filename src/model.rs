use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::rc::Rc;

/// Client settings persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_server_host")]
    pub server_host: String,
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    /// `time` format templates tried in order when normalizing album date
    /// tags; most specific first. See [`crate::dates::normalize_date`].
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

fn default_server_host() -> String {
    String::from("localhost")
}

fn default_server_port() -> u16 {
    6600
}

fn default_date_formats() -> Vec<String> {
    vec![
        String::from("[year]-[month]-[day]"),
        String::from("[year]-[month]"),
        String::from("[year]"),
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_host: default_server_host(),
            server_port: default_server_port(),
            date_formats: default_date_formats(),
        }
    }
}

/// A named artist. Identity is the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub name: String,
}

impl Artist {
    pub fn new(name: &str) -> Rc<Artist> {
        Rc::new(Artist {
            name: name.to_string(),
        })
    }
}

/// An album as reported by the server. The artist is shared, not owned:
/// artists outlive the albums that reference them.
#[derive(Debug, Clone)]
pub struct Album {
    pub artist: Rc<Artist>,
    pub title: String,
    /// Normalized sortable date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`), or
    /// `None` when the raw date was absent or unparseable. See
    /// [`crate::dates::normalize_date`].
    pub date: Option<String>,
    /// Directory tag fixed at construction.
    pub directory: String,
}

impl Album {
    pub fn new(artist: Rc<Artist>, title: &str, date: Option<String>, directory: &str) -> Album {
        Album {
            artist,
            title: title.to_string(),
            date,
            directory: directory.to_string(),
        }
    }

    pub fn year(&self) -> Option<i32> {
        crate::dates::year_of(self.date.as_deref()?)
    }
}

/// An album reached through a genre filter; the genre participates in every
/// ordering of these, ahead of the album's own keys.
#[derive(Debug, Clone)]
pub struct GenreFilteredAlbum {
    pub genre: String,
    pub album: Album,
}

/// A playable file in the remote library. Paths are server-relative with
/// `/` separators regardless of platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub path: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_secs: Option<i64>,
}

impl Song {
    pub fn new(path: &str) -> Song {
        Song {
            path: path.to_string(),
            title: None,
            artist: None,
            album: None,
            duration_secs: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Song {
        self.title = Some(title.to_string());
        self
    }
}

/// A playable network stream: URL plus a human label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioStream {
    pub url: String,
    pub label: String,
}

/// Anything with a path and a title can be played and can round-trip
/// through a playlist file entry.
pub trait Playable {
    fn path(&self) -> &str;
    fn title(&self) -> String;
    fn duration_secs(&self) -> Option<i64> {
        None
    }
}

impl Playable for Song {
    fn path(&self) -> &str {
        &self.path
    }

    fn title(&self) -> String {
        match self.title.as_ref().filter(|title| !title.trim().is_empty()) {
            Some(title) => title.clone(),
            None => file_label(&self.path),
        }
    }

    fn duration_secs(&self) -> Option<i64> {
        self.duration_secs
    }
}

impl Playable for AudioStream {
    fn path(&self) -> &str {
        &self.url
    }

    fn title(&self) -> String {
        self.label.clone()
    }
}

/// One library entity as shown in the browser. Ordering is defined within a
/// kind only; comparing across kinds is a caller bug and panics.
#[derive(Debug, Clone)]
pub enum LibraryEntity {
    Artist(Rc<Artist>),
    Album(Album),
    GenreAlbum(GenreFilteredAlbum),
    Directory { name: String, full: String },
    Song(Song),
    Stream(AudioStream),
}

impl LibraryEntity {
    pub fn kind(&self) -> &'static str {
        match self {
            LibraryEntity::Artist(_) => "artist",
            LibraryEntity::Album(_) => "album",
            LibraryEntity::GenreAlbum(_) => "genre album",
            LibraryEntity::Directory { .. } => "directory",
            LibraryEntity::Song(_) => "song",
            LibraryEntity::Stream(_) => "stream",
        }
    }

    /// Human label for the browser row.
    pub fn display_string(&self) -> String {
        match self {
            LibraryEntity::Artist(artist) => artist.name.clone(),
            LibraryEntity::Album(album) => album.title.clone(),
            LibraryEntity::GenreAlbum(genre_album) => genre_album.album.title.clone(),
            LibraryEntity::Directory { name, .. } => name.clone(),
            LibraryEntity::Song(song) => song.title(),
            LibraryEntity::Stream(stream) => stream.label.clone(),
        }
    }

    /// Natural same-kind total order.
    ///
    /// # Panics
    ///
    /// Panics when `self` and `other` are different kinds. The browser never
    /// sorts mixed rows against each other, so a cross-kind comparison is a
    /// programming error rather than a recoverable condition.
    pub fn compare(&self, other: &LibraryEntity) -> Ordering {
        match (self, other) {
            (LibraryEntity::Artist(a), LibraryEntity::Artist(b)) => a.name.cmp(&b.name),
            (LibraryEntity::Album(a), LibraryEntity::Album(b)) => {
                crate::order::albums_by_title(a, b)
            }
            (LibraryEntity::GenreAlbum(a), LibraryEntity::GenreAlbum(b)) => {
                crate::order::genre_albums_by_title(a, b)
            }
            (LibraryEntity::Directory { full: a, .. }, LibraryEntity::Directory { full: b, .. }) => {
                a.cmp(b)
            }
            (LibraryEntity::Song(a), LibraryEntity::Song(b)) => a.path.cmp(&b.path),
            (LibraryEntity::Stream(a), LibraryEntity::Stream(b)) => {
                a.label.cmp(&b.label).then_with(|| a.url.cmp(&b.url))
            }
            (a, b) => panic!("cannot compare a {} against a {}", a.kind(), b.kind()),
        }
    }

    /// The playable view of a leaf entity, if it has one.
    pub fn playable(&self) -> Option<&dyn Playable> {
        match self {
            LibraryEntity::Song(song) => Some(song),
            LibraryEntity::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

/// Handle into a [`DirectoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectoryId(usize);

/// One child slot of a directory, in server listing order.
#[derive(Debug, Clone)]
pub enum DirectoryItem {
    Directory(DirectoryId),
    Song(Song),
}

#[derive(Debug)]
struct DirectoryNode {
    name: String,
    parent: Option<DirectoryId>,
    children: Vec<DirectoryItem>,
}

/// The server's directory listing as a tree. Directories own their children;
/// the parent link is a plain back-handle, so no ownership cycles.
#[derive(Debug, Default)]
pub struct DirectoryTree {
    nodes: Vec<DirectoryNode>,
}

impl DirectoryTree {
    pub fn new() -> DirectoryTree {
        DirectoryTree::default()
    }

    pub fn add_root(&mut self, name: &str) -> DirectoryId {
        self.insert(name, None)
    }

    pub fn add_directory(&mut self, parent: DirectoryId, name: &str) -> DirectoryId {
        let id = self.insert(name, Some(parent));
        self.nodes[parent.0]
            .children
            .push(DirectoryItem::Directory(id));
        id
    }

    pub fn add_song(&mut self, parent: DirectoryId, song: Song) {
        self.nodes[parent.0].children.push(DirectoryItem::Song(song));
    }

    fn insert(&mut self, name: &str, parent: Option<DirectoryId>) -> DirectoryId {
        let id = DirectoryId(self.nodes.len());
        self.nodes.push(DirectoryNode {
            name: name.to_string(),
            parent,
            children: Vec::new(),
        });
        id
    }

    pub fn name(&self, id: DirectoryId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn parent(&self, id: DirectoryId) -> Option<DirectoryId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: DirectoryId) -> &[DirectoryItem] {
        &self.nodes[id.0].children
    }

    /// Path from the root to this directory, joined with `/`. A root's full
    /// path is just its name. Computed on demand from the parent chain.
    pub fn full_path(&self, id: DirectoryId) -> String {
        let mut segments = vec![self.nodes[id.0].name.as_str()];
        let mut cursor = self.nodes[id.0].parent;
        while let Some(parent) = cursor {
            segments.push(self.nodes[parent.0].name.as_str());
            cursor = self.nodes[parent.0].parent;
        }
        segments.reverse();
        segments.join("/")
    }

    /// Snapshot of a directory as a browser entity.
    pub fn entity(&self, id: DirectoryId) -> LibraryEntity {
        LibraryEntity::Directory {
            name: self.nodes[id.0].name.clone(),
            full: self.full_path(id),
        }
    }
}

/// Display label for a pathname with no usable title tag: the file name
/// without its extension.
pub fn file_label(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[..dot].to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_path_walks_parent_chain() {
        let mut tree = DirectoryTree::new();
        let root = tree.add_root("music");
        let rock = tree.add_directory(root, "rock");
        let floyd = tree.add_directory(rock, "pink_floyd");

        assert_eq!(tree.full_path(root), "music");
        assert_eq!(tree.full_path(floyd), "music/rock/pink_floyd");
        assert_eq!(tree.parent(floyd), Some(rock));
        assert_eq!(tree.parent(root), None);
    }

    #[test]
    fn directory_children_keep_insertion_order() {
        let mut tree = DirectoryTree::new();
        let root = tree.add_root("music");
        tree.add_song(root, Song::new("music/01.mp3"));
        let sub = tree.add_directory(root, "live");
        tree.add_song(root, Song::new("music/02.mp3"));

        let kinds: Vec<&str> = tree
            .children(root)
            .iter()
            .map(|item| match item {
                DirectoryItem::Song(_) => "song",
                DirectoryItem::Directory(_) => "dir",
            })
            .collect();
        assert_eq!(kinds, vec!["song", "dir", "song"]);
        assert_eq!(tree.full_path(sub), "music/live");
    }

    #[test]
    fn song_title_falls_back_to_file_name() {
        let tagged = Song::new("music/a.mp3").with_title("Echoes");
        let untagged = Song::new("music/deep/one more red nightmare.flac");

        assert_eq!(tagged.title(), "Echoes");
        assert_eq!(untagged.title(), "one more red nightmare");
    }

    #[test]
    fn directories_order_by_full_path() {
        let a = LibraryEntity::Directory {
            name: String::from("b"),
            full: String::from("a/b"),
        };
        let b = LibraryEntity::Directory {
            name: String::from("a"),
            full: String::from("z/a"),
        };
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    #[test]
    #[should_panic(expected = "cannot compare")]
    fn cross_kind_comparison_panics() {
        let artist = LibraryEntity::Artist(Artist::new("Camel"));
        let song = LibraryEntity::Song(Song::new("a.mp3"));
        let _ = artist.compare(&song);
    }
}
