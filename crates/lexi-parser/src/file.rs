use std::path::Path;

use crate::error::ParseError;

const TEXT_EXTENSIONS: &[&str] = &["txt", "csv", "tsv", "tab", "text", "dic"];

const REJECTED: &[(&[&str], &str)] = &[
    (&["pdf"], "PDF documents are not plain text; export the list as CSV or TXT"),
    (
        &["doc", "docx", "odt", "rtf", "pages"],
        "word processor files are not plain text; save the list as TXT",
    ),
    (
        &["xls", "xlsx", "ods", "numbers"],
        "spreadsheets must be exported as CSV before importing",
    ),
    (
        &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff", "heic"],
        "images cannot be imported as word lists",
    ),
    (
        &["zip", "gz", "tgz", "7z", "rar", "tar", "bz2", "xz", "apkg"],
        "archives must be extracted first",
    ),
    (
        &["mp3", "wav", "ogg", "m4a", "flac", "mp4", "mkv", "mov"],
        "audio and video files cannot be imported as word lists",
    ),
];

/// Reject files that cannot be a plain-text word list, based on extension.
///
/// Unknown extensions are let through; the parser's binary sniffing catches
/// the rest.
pub fn check_file_type(path: &Path) -> Result<(), ParseError> {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return Ok(());
    };
    let extension = extension.to_ascii_lowercase();
    if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(());
    }

    match REJECTED
        .iter()
        .find(|(extensions, _)| extensions.contains(&extension.as_str()))
    {
        Some((_, reason)) => Err(ParseError::UnsupportedFileType { extension, reason }),
        None => {
            tracing::debug!("Unknown extension '.{}', treating as text", extension);
            Ok(())
        }
    }
}

/// A NUL byte never appears in a UTF-8 word list
pub(crate) fn looks_binary(chunk: &[u8]) -> bool {
    chunk.iter().take(8192).any(|b| *b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_files_pass() {
        for name in ["list.txt", "LIST.CSV", "words.tsv", "words", "words.unknown"] {
            assert!(check_file_type(Path::new(name)).is_ok(), "{name}");
        }
    }

    #[test]
    fn documents_and_media_are_rejected() {
        let err = check_file_type(Path::new("scan.PDF")).unwrap_err();
        assert!(err.to_string().contains(".pdf"));

        for name in ["a.docx", "a.xlsx", "a.png", "a.zip", "a.mp3"] {
            assert!(
                matches!(
                    check_file_type(Path::new(name)),
                    Err(ParseError::UnsupportedFileType { .. })
                ),
                "{name}"
            );
        }
    }

    #[test]
    fn nul_bytes_mean_binary() {
        assert!(looks_binary(b"PK\x03\x04\x00\x00"));
        assert!(!looks_binary("cat,猫\n".as_bytes()));
    }
}
