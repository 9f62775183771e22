//! Torrent metainfo reader.
//!
//! Uses librqbit-core to parse bencoded .torrent data into the attributes the
//! naming context needs. Nothing is downloaded and nothing is written.

use std::path::Path;

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when reading torrent files.
#[derive(Debug, Error)]
pub enum TorrentParseError {
    #[error("Failed to parse torrent: {0}")]
    ParseError(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Empty torrent (no files)")]
    EmptyTorrent,
}

/// One file inside a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentFile {
    /// Path including the torrent's root folder for multi-file torrents.
    pub path: String,
    pub size: u64,
}

/// What the naming context reads from a torrent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentAttributes {
    pub name: String,
    /// Lowercase hex info hash.
    pub hash: String,
    /// Total payload size in bytes.
    pub size: u64,
    pub files: Vec<TorrentFile>,
    /// Client-side category; not part of the metainfo.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TorrentAttributes {
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Parse a .torrent file.
///
/// Supports both single-file and multi-file torrents.
pub fn parse_torrent(bytes: &[u8]) -> Result<TorrentAttributes, TorrentParseError> {
    let torrent: TorrentMetaV1Owned =
        torrent_from_bytes(bytes).map_err(|e| TorrentParseError::ParseError(e.to_string()))?;

    let info = &torrent.info;

    // Folder name for multi-file, file name for single-file
    let name = info
        .name
        .as_ref()
        .map(|b| bytes_to_string(b.as_ref()))
        .unwrap_or_else(|| "unknown".to_string());

    let files = if let Some(ref files) = info.files {
        files
            .iter()
            .map(|file| {
                let mut parts = vec![name.clone()];
                parts.extend(file.path.iter().map(|p| bytes_to_string(p.as_ref())));
                TorrentFile {
                    path: parts.join("/"),
                    size: file.length,
                }
            })
            .collect()
    } else if let Some(length) = info.length {
        vec![TorrentFile {
            path: name.clone(),
            size: length,
        }]
    } else {
        Vec::new()
    };

    if files.is_empty() {
        return Err(TorrentParseError::EmptyTorrent);
    }

    Ok(TorrentAttributes {
        name,
        hash: torrent.info_hash.as_string(),
        size: files.iter().map(|f| f.size).sum(),
        files,
        category: String::new(),
        tags: Vec::new(),
    })
}

/// Read and parse a .torrent file from disk.
pub fn read_torrent(path: &Path) -> Result<TorrentAttributes, TorrentParseError> {
    let bytes = std::fs::read(path).map_err(|source| TorrentParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_torrent(&bytes)
}

/// Lossy UTF-8; invalid sequences become replacement characters.
fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIECES: &str = "aaaaaaaaaaaaaaaaaaaa";

    fn single_file() -> Vec<u8> {
        format!(
            "d4:infod6:lengthi1000e4:name8:film.mkv12:piece lengthi16384e6:pieces20:{}ee",
            PIECES
        )
        .into_bytes()
    }

    fn multi_file() -> Vec<u8> {
        format!(
            "d4:infod5:filesld6:lengthi700e4:pathl9:Andor.mkveed6:lengthi20e4:pathl4:Subs6:en.srteee\
             4:name5:Andor12:piece lengthi16384e6:pieces20:{}ee",
            PIECES
        )
        .into_bytes()
    }

    #[test]
    fn test_single_file_torrent() {
        let attrs = parse_torrent(&single_file()).unwrap();
        assert_eq!(attrs.name, "film.mkv");
        assert_eq!(attrs.size, 1000);
        assert_eq!(
            attrs.files,
            vec![TorrentFile {
                path: "film.mkv".to_string(),
                size: 1000
            }]
        );
        assert_eq!(attrs.hash, "ce778e581b7378cb89fb4c6da8b11c88950ed4d4");
    }

    #[test]
    fn test_multi_file_torrent() {
        let attrs = parse_torrent(&multi_file()).unwrap();
        assert_eq!(attrs.name, "Andor");
        assert_eq!(attrs.size, 720);
        let paths: Vec<&str> = attrs.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["Andor/Andor.mkv", "Andor/Subs/en.srt"]);
        assert_eq!(attrs.hash, "7df97b8c45733a809aa2448155107feeaf7f85e6");
    }

    #[test]
    fn test_with_category_and_tags() {
        let attrs = parse_torrent(&single_file())
            .unwrap()
            .with_category("movies")
            .with_tags(vec!["hd".to_string()]);
        assert_eq!(attrs.category, "movies");
        assert_eq!(attrs.tags, vec!["hd"]);
    }

    #[test]
    fn test_parse_invalid_torrent() {
        assert!(parse_torrent(b"not a valid torrent").is_err());
        assert!(parse_torrent(b"").is_err());
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_torrent(Path::new("/nonexistent/file.torrent"));
        assert!(matches!(result, Err(TorrentParseError::Io { .. })));
    }

    #[test]
    fn test_bytes_to_string_invalid_utf8() {
        let invalid = vec![0xff, 0xfe, 0x68, 0x65, 0x6c, 0x6c, 0x6f];
        assert!(bytes_to_string(&invalid).contains("hello"));
    }
}
