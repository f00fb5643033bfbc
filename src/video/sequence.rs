use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::Error;
use crate::frame::Frame;

const EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Reads a video from a directory of image files.
///
/// The frames are the directory's JPEG and PNG files in lexicographic order of their file names,
/// the layout written by [`ImageDirSink`](crate::recorder::ImageDirSink). This allows replaying a
/// recorded flight (or any other footage) without a drone.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    files: std::vec::IntoIter<PathBuf>,
    len: usize,
}

impl ImageSequence {
    /// Opens the image sequence in `dir`.
    ///
    /// Fails if the directory cannot be read or contains no images.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let err = |reason: String| Error::VideoSource {
            path: dir.to_path_buf(),
            reason,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| err(e.to_string()))? {
            let path = entry.map_err(|e| err(e.to_string()))?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| {
                    EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e))
                });
            if is_image && path.is_file() {
                files.push(path);
            }
        }

        if files.is_empty() {
            return Err(err("directory contains no images".into()));
        }
        files.sort();

        log::info!("opened image sequence '{}' ({} frames)", dir.display(), files.len());
        Ok(Self {
            len: files.len(),
            files: files.into_iter(),
        })
    }

    /// Returns the total number of images in the sequence.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Iterator for ImageSequence {
    type Item = Frame;

    /// Loads the next image, skipping files that fail to decode.
    fn next(&mut self) -> Option<Frame> {
        for path in self.files.by_ref() {
            match Frame::load(&path) {
                Ok(frame) => return Some(frame),
                Err(e) => log::warn!("skipping frame: {e:#}"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Color;
    use crate::resolution::Resolution;
    use crate::test::temp_dir;

    #[test]
    fn reads_images_in_order() {
        let dir = temp_dir("sequence-order");
        for (name, shade) in [("b.png", 2), ("a.png", 1), ("c.png", 3)] {
            Frame::filled(Resolution::new(4, 4), Color::from_rgb8(shade, 0, 0))
                .save(dir.path().join(name))
                .unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let seq = ImageSequence::open(dir.path()).unwrap();
        assert_eq!(seq.len(), 3);
        let reds = seq.map(|f| f.get(0, 0).r()).collect::<Vec<_>>();
        assert_eq!(reds, [1, 2, 3]);
    }

    #[test]
    fn corrupt_images_are_skipped() {
        let dir = temp_dir("sequence-corrupt");
        fs::write(dir.path().join("0.jpg"), "garbage").unwrap();
        Frame::new(4, 4).save(dir.path().join("1.png")).unwrap();

        let seq = ImageSequence::open(dir.path()).unwrap();
        assert_eq!(seq.count(), 1);
    }

    #[test]
    fn empty_directory() {
        let dir = temp_dir("sequence-empty");
        let err = ImageSequence::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::VideoSource { .. }));
    }

    #[test]
    fn missing_directory() {
        let dir = temp_dir("sequence-missing");
        let err = ImageSequence::open(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::VideoSource { .. }));
    }
}
