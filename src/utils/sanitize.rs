use ammonia;

/// Clean user-authored HTML using the ammonia library.
///
/// Whitelist-based sanitization: safe formatting tags survive, while
/// <script>, <iframe> and event-handler attributes are stripped. Applied to
/// blog content from the rich-text editor and to comment bodies before they
/// are persisted, so stored markup is safe for any client to render.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
