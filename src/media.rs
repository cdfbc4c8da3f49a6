use mime::Mime;
use snafu::{ensure, ResultExt, Snafu};
use std::path::{Path, PathBuf};

/// Content type used when the extension gives no usable answer.
pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("cannot access video '{}'", path.display()))]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("video path is a directory: {}", path.display()))]
    IsDirectory { path: PathBuf },
}

/// Content type for the video at `path`, judged by its extension.
///
/// The path must exist and must not be a directory. Extensions are matched
/// case-insensitively. Missing extensions, extensions the table does not know
/// and extensions that map to non-media types all yield [`DEFAULT_VIDEO_MIME`].
/// Parameters such as `; charset=...` are dropped.
pub fn detect_video_mime(path: &Path) -> Result<Mime, Error> {
    let metadata = std::fs::metadata(path).context(StatSnafu { path })?;
    ensure!(!metadata.is_dir(), IsDirectorySnafu { path });

    let guessed = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .and_then(|ext| mime_guess::from_ext(&ext).first())
        .filter(is_media);

    Ok(match guessed {
        Some(mime) => strip_params(&mime),
        None => default_mime(),
    })
}

fn is_media(mime: &Mime) -> bool {
    [mime::VIDEO, mime::AUDIO, mime::IMAGE].contains(&mime.type_())
}

fn strip_params(mime: &Mime) -> Mime {
    mime.essence_str().parse().unwrap_or_else(|_| default_mime())
}

fn default_mime() -> Mime {
    DEFAULT_VIDEO_MIME
        .parse()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42").unwrap();
        path
    }

    fn detect(dir: &TempDir, name: &str) -> String {
        detect_video_mime(&touch(dir, name)).unwrap().to_string()
    }

    #[test]
    fn known_video_extensions() {
        let dir = TempDir::new().unwrap();
        assert_eq!(detect(&dir, "demo.mp4"), "video/mp4");
        assert_eq!(detect(&dir, "DEMO.MP4"), "video/mp4");
        assert_eq!(detect(&dir, "clip.mov"), "video/quicktime");
        assert_eq!(detect(&dir, "clip.webm"), "video/webm");
    }

    #[test]
    fn unknown_or_missing_extension_falls_back() {
        let dir = TempDir::new().unwrap();
        assert_eq!(detect(&dir, "clip.xyz"), DEFAULT_VIDEO_MIME);
        assert_eq!(detect(&dir, "clip.notarealextension"), DEFAULT_VIDEO_MIME);
        assert_eq!(detect(&dir, "clip"), DEFAULT_VIDEO_MIME);
    }

    #[test]
    fn non_media_types_fall_back() {
        let dir = TempDir::new().unwrap();
        assert_eq!(detect(&dir, "notes.txt"), DEFAULT_VIDEO_MIME);
    }

    #[test]
    fn directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("frames.mp4");
        std::fs::create_dir(&sub).unwrap();

        let err = detect_video_mime(&sub).unwrap_err();
        assert!(matches!(err, Error::IsDirectory { .. }), "{err:?}");
    }

    #[test]
    fn missing_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = detect_video_mime(&dir.path().join("absent.mp4")).unwrap_err();
        assert!(matches!(err, Error::Stat { .. }), "{err:?}");
    }
}
