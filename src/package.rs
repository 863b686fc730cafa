//! Output packaging: the zip archive and per-card files.

use std::io::{Cursor, Write};
use std::path::Path;

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::card::CardDeck;
use crate::error::{CardError, CardResult};

/// Name of the hashtag entry inside the archive.
pub const HASHTAGS_ENTRY: &str = "hashtags.txt";

/// Builds the archive in memory: one `card_NN.png` per card, plus
/// [`HASHTAGS_ENTRY`] when `hashtags` is non-empty.
pub fn archive_bytes(deck: &CardDeck, hashtags: &str) -> CardResult<Vec<u8>> {
    if deck.is_empty() {
        return Err(CardError::render("refusing to package an empty deck"));
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for card in deck {
        zip.start_file(card.file_name(), options)?;
        zip.write_all(&card.to_png()?)?;
    }
    if !hashtags.trim().is_empty() {
        zip.start_file(HASHTAGS_ENTRY, options)?;
        zip.write_all(hashtags.trim().as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Writes the archive to `path`.
///
/// The archive is fully built before anything touches the disk, then written
/// to a sibling temporary file and renamed into place, so `path` never holds
/// a partial archive. The temporary file is removed when either step fails.
#[tracing::instrument(skip(deck, hashtags), fields(cards = deck.len()))]
pub fn write_archive(path: &Path, deck: &CardDeck, hashtags: &str) -> CardResult<()> {
    let bytes = archive_bytes(deck, hashtags)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| CardError::input(format!("archive path {} has no file name", path.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".partial");
    let temp = path.with_file_name(temp_name);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let committed = std::fs::write(&temp, &bytes).and_then(|()| std::fs::rename(&temp, path));
    if let Err(err) = committed {
        if let Err(cleanup) = std::fs::remove_file(&temp) {
            tracing::debug!(path = %temp.display(), %cleanup, "temporary archive not removed");
        }
        return Err(err.into());
    }

    tracing::info!(path = %path.display(), bytes = bytes.len(), "archive written");
    Ok(())
}

/// Writes each card as `card_NN.png` into `dir`.
pub fn write_cards(dir: &Path, deck: &CardDeck) -> CardResult<()> {
    std::fs::create_dir_all(dir)?;
    for card in deck {
        std::fs::write(dir.join(card.file_name()), card.to_png()?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::card::RenderedCard;

    fn deck(n: usize) -> CardDeck {
        CardDeck::from_cards(
            (1..=n)
                .map(|i| RenderedCard::new(i, RgbaImage::from_pixel(16, 16, Rgba([i as u8 * 20, 0, 0, 255]))))
                .collect(),
        )
    }

    #[test]
    fn card_pngs_roundtrip_pixels() {
        let bytes = archive_bytes(&deck(1), "").unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut png = Vec::new();
        archive.by_name("card_01.png").unwrap().read_to_end(&mut png).unwrap();

        let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
        assert_eq!(decoded, RgbaImage::from_pixel(16, 16, Rgba([20, 0, 0, 255])));
    }

    #[test]
    fn archive_lists_cards_in_order_with_hashtags() {
        let bytes = archive_bytes(&deck(3), "#금리 #한국은행").unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, ["card_01.png", "card_02.png", "card_03.png", "hashtags.txt"]);

        let mut tags = String::new();
        archive.by_name(HASHTAGS_ENTRY).unwrap().read_to_string(&mut tags).unwrap();
        assert_eq!(tags, "#금리 #한국은행");
    }

    #[test]
    fn blank_hashtags_are_omitted() {
        let bytes = archive_bytes(&deck(1), "  ").unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn empty_deck_is_not_packaged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.zip");

        assert!(write_archive(&path, &CardDeck::new(), "").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn archive_is_committed_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("deck.zip");

        write_archive(&path, &deck(2), "#a").unwrap();

        assert!(path.is_file());
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("deck.zip")]);
    }

    #[test]
    fn failed_commit_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.zip");
        // A non-empty directory at the target makes the rename fail.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep.txt"), b"x").unwrap();

        assert!(write_archive(&path, &deck(2), "#a").is_err());

        assert!(!dir.path().join("deck.zip.partial").exists());
        assert!(path.join("keep.txt").is_file());
    }

    #[test]
    fn cards_are_written_individually() {
        let dir = tempfile::tempdir().unwrap();
        write_cards(dir.path(), &deck(2)).unwrap();
        assert!(dir.path().join("card_02.png").is_file());
    }
}
