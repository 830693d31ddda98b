use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive,
/// dangerous ones (<script>, <iframe>) and event-handler attributes are
/// stripped. Applied to everything buyers and sellers type free-form:
/// product descriptions, review comments, seller bio and story.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags() {
        let dirty = "Lovely mug<script>alert('xss')</script>";
        assert_eq!(clean_html(dirty), "Lovely mug");
    }

    #[test]
    fn keeps_harmless_markup() {
        assert_eq!(clean_html("hand-<b>thrown</b> stoneware"), "hand-<b>thrown</b> stoneware");
    }
}
