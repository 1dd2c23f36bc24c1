/// file name used when the caller doesn't send one
pub const DEFAULT_DISPLAY_NAME: &str = "video";

/// every relayed download is saved as mp4 regardless of what the origin serves
pub const DOWNLOAD_EXTENSION: &str = "mp4";

/// builds `attachment; filename="<name>.mp4"`
///
/// the name is used as given apart from what would break the quoted-string: backslashes and
/// quotes get escaped, control characters (CR/LF included) are dropped
pub fn attachment_disposition(display_name: &str) -> String {
    let escaped = escape_file_name(display_name);
    let name = if escaped.is_empty() {
        DEFAULT_DISPLAY_NAME.to_string()
    } else {
        escaped
    };

    format!("attachment; filename=\"{}.{}\"", name, DOWNLOAD_EXTENSION)
}

fn escape_file_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_control() => {}
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name_is_interpolated() {
        assert_eq!(
            attachment_disposition("My Episode"),
            r#"attachment; filename="My Episode.mp4""#
        );
    }

    #[test]
    fn empty_name_falls_back_to_default() {
        assert_eq!(
            attachment_disposition(""),
            r#"attachment; filename="video.mp4""#
        );
        // only control characters is as good as empty
        assert_eq!(
            attachment_disposition("\r\n"),
            r#"attachment; filename="video.mp4""#
        );
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        assert_eq!(
            attachment_disposition(r#"The "Best" \ Cut"#),
            r#"attachment; filename="The \"Best\" \\ Cut.mp4""#
        );
    }

    #[test]
    fn header_injection_is_stripped() {
        let value = attachment_disposition("evil\r\nSet-Cookie: a=b");
        assert!(!value.contains('\r'));
        assert!(!value.contains('\n'));
        assert_eq!(value, r#"attachment; filename="evilSet-Cookie: a=b.mp4""#);
    }

    #[test]
    fn unicode_is_kept() {
        assert_eq!(
            attachment_disposition("進撃の巨人 01"),
            "attachment; filename=\"進撃の巨人 01.mp4\""
        );
    }
}
