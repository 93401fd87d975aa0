use super::render::FOOTER;

const GENERIC_LABEL: &str = "Slackの内容";

fn heading_label(line: &str) -> &'static str {
    if line.contains("スレッド") {
        super::render::THREAD_LABEL
    } else if line.contains("チャンネル") {
        super::render::CHANNEL_LABEL
    } else {
        GENERIC_LABEL
    }
}

/// The `YYYY/MM/DD 取得` part of a header line, if present.
fn capture_stamp(line: &str) -> Option<&str> {
    let (_, after) = line.split_once('(')?;
    let (stamp, _) = after.split_once(')')?;
    let (date, suffix) = stamp.split_once(' ')?;

    let parts: Vec<&str> = date.split('/').collect();
    let well_formed = suffix == "取得"
        && matches!(parts.as_slice(), [y, m, d]
            if y.len() == 4 && m.len() == 2 && d.len() == 2
                && parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())));

    well_formed.then_some(stamp)
}

fn is_header(line: &str) -> bool {
    line.contains("--- Slack") && line.contains("の内容")
}

fn heading(line: &str) -> String {
    let label = heading_label(line);
    match capture_stamp(line) {
        Some(stamp) => format!("# {} ({})", label, stamp),
        None => format!("# {}", label),
    }
}

/// Turn a plain-text transcript into Markdown.
///
/// Only the first line (when it is a transcript header) and the last line
/// (when it is exactly the footer) change; every other line is kept verbatim.
pub fn to_markdown(content: &str) -> String {
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();

    if lines.last().is_some_and(|line| line == FOOTER) {
        lines.pop();
    }
    if let Some(first) = lines.first_mut()
        && is_header(first)
    {
        *first = heading(first);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_header_becomes_heading() {
        let text = "--- Slackスレッドの内容 (2026/02/10 取得) ---\n\n[2026-02-10 11:18:07][@alice]:\nhello\n\n--- ここまで ---";
        assert_eq!(
            to_markdown(text),
            "# Slackスレッドの内容 (2026/02/10 取得)\n\n[2026-02-10 11:18:07][@alice]:\nhello\n"
        );
    }

    #[test]
    fn test_channel_header_keeps_channel_line() {
        let text = "--- Slackチャンネルの内容 (2024/01/05 取得) ---\nチャンネル: #general\n\nbody\n--- ここまで ---";
        assert_eq!(
            to_markdown(text),
            "# Slackチャンネルの内容 (2024/01/05 取得)\nチャンネル: #general\n\nbody"
        );
    }

    #[test]
    fn test_header_without_date() {
        assert_eq!(to_markdown("--- Slackスレッドの内容 ---"), "# Slackスレッドの内容");
        assert_eq!(to_markdown("--- Slackの内容 (soon) ---"), "# Slackの内容");
    }

    #[test]
    fn test_body_lines_matching_header_or_footer_text_are_kept() {
        let text = "--- Slackスレッドの内容 (2026/02/10 取得) ---\n\n\
                    [2026-02-10 11:18:07][@alice]:\n\
                    quote: --- ここまで --- end\n\
                    --- Slackの内容 in body\n\
                    --- ここまで ---\n\n\
                    --- ここまで ---";
        assert_eq!(
            to_markdown(text),
            "# Slackスレッドの内容 (2026/02/10 取得)\n\n\
             [2026-02-10 11:18:07][@alice]:\n\
             quote: --- ここまで --- end\n\
             --- Slackの内容 in body\n\
             --- ここまで ---\n"
        );
    }

    #[test]
    fn test_other_lines_untouched() {
        let text = "[2026-02-10 11:18:07][@alice]:\n# already markdown\n  └─ reply";
        assert_eq!(to_markdown(text), text);
    }
}
