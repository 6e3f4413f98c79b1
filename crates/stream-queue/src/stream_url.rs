//! Shared helpers for constructing stream URLs.

use std::path::Path;

/// Build the `file://` URL for a track on disk.
///
/// Path segments are percent-encoded; separators and drive colons are kept.
pub fn local_stream_url(path: &Path) -> String {
    let path_str = path.to_string_lossy().replace('\\', "/");
    let encoded = path_str
        .split('/')
        .map(|segment| urlencoding::encode(segment).replace("%3A", ":"))
        .collect::<Vec<_>>()
        .join("/");
    if encoded.starts_with('/') {
        format!("file://{encoded}")
    } else {
        format!("file:///{encoded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_file_url_for_absolute_path() {
        assert_eq!(
            local_stream_url(Path::new("/music/a.mp3")),
            "file:///music/a.mp3"
        );
    }

    #[test]
    fn encodes_spaces_and_unicode() {
        assert_eq!(
            local_stream_url(Path::new("/music/My Band/ä.flac")),
            "file:///music/My%20Band/%C3%A4.flac"
        );
    }

    #[test]
    fn keeps_drive_letter_on_windows_style_paths() {
        assert_eq!(
            local_stream_url(Path::new("C:\\Music\\a.mp3")),
            "file:///C:/Music/a.mp3"
        );
    }
}
