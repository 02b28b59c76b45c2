//! User-facing message texts. All texts are Telegram HTML.

use fieldex_sessions::{InvalidArgument, Session};

/// Escape text for interpolation into Telegram HTML.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn settings_lines(session: &Session) -> String {
    format!(
        "• Field index: <code>{}</code> (field #{})\n• Delimiter: <code>{}</code>",
        session.field_index,
        session.ordinal(),
        escape_html(&session.delimiter),
    )
}

pub fn welcome(session: &Session) -> String {
    format!(
        "👋 Hi! I extract a single field from every line of a text file.\n\n\
         📤 Send me a .txt file and I will return the selected field of each line.\n\n\
         <b>Current settings:</b>\n{}\n\n\
         <b>Commands:</b>\n\
         /set_index N - set the field index (0-based)\n\
         /set_delimiter S - set the delimiter\n\
         /settings - show current settings\n\
         /help - usage help",
        settings_lines(session)
    )
}

pub fn help() -> String {
    "<b>📖 Usage</b>\n\n\
     The bot splits every line of your file on a delimiter and keeps one field.\n\n\
     <b>Example input:</b>\n\
     <code>user1:pass1:email1:data1:info1:token1</code>\n\
     <code>user2:pass2:email2:data2:info2:token2</code>\n\n\
     With index 5 and delimiter ':' you get:\n\
     <code>token1</code>\n\
     <code>token2</code>\n\n\
     Blank lines, lines with too few fields and empty fields are skipped.\n\n\
     <b>Settings:</b>\n\
     /set_index 2 - extract the 3rd field (counting from 0)\n\
     /set_delimiter | - split on |\n\
     /settings - current settings"
        .to_string()
}

pub fn settings(session: &Session) -> String {
    format!("⚙️ <b>Current settings:</b>\n\n{}", settings_lines(session))
}

pub fn index_usage() -> String {
    "❌ Specify the field index.\nExample: <code>/set_index 5</code>".to_string()
}

pub fn index_set(session: &Session) -> String {
    format!(
        "✅ Field index set: <code>{}</code> (field #{})",
        session.field_index,
        session.ordinal()
    )
}

pub fn delimiter_usage() -> String {
    "❌ Specify the delimiter.\n\
     Example: <code>/set_delimiter :</code> or <code>/set_delimiter |</code>"
        .to_string()
}

pub fn delimiter_set(session: &Session) -> String {
    format!(
        "✅ Delimiter set: <code>{}</code>",
        escape_html(&session.delimiter)
    )
}

/// Reply for a rejected setting value.
pub fn invalid_argument(reason: &InvalidArgument) -> String {
    match reason {
        InvalidArgument::NotAnInteger(_) => {
            "❌ Not a valid number. Use an integer >= 0.".to_string()
        },
        InvalidArgument::Negative(_) => "❌ The index must be a non-negative number.".to_string(),
        InvalidArgument::EmptyDelimiter => delimiter_usage(),
    }
}

pub fn wrong_file_type() -> String {
    "❌ Please send a text file (.txt)".to_string()
}

pub fn file_too_large(size: u64, max: u64) -> String {
    format!("❌ The file is too large ({size} bytes). The limit is {max} bytes.")
}

pub fn processing() -> String {
    "⏳ Processing the file...".to_string()
}

pub fn zero_matches() -> String {
    "⚠️ No lines with the selected field were found.\n\
     Check your settings (field index and delimiter)."
        .to_string()
}

pub fn done_caption(written: usize, session: &Session) -> String {
    format!(
        "✅ Done! Extracted <b>{written}</b> lines.\n\nSettings:\n{}",
        settings_lines(session)
    )
}

pub fn failure(error: &str) -> String {
    format!(
        "❌ Failed to process the file:\n<code>{}</code>",
        escape_html(error)
    )
}

pub fn fallback() -> String {
    "📄 Send me a .txt file to process.\nOr use /help for instructions.".to_string()
}
