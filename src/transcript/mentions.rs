//! Reference tokens embedded in message bodies.
//!
//! Slack encodes mentions as angle-bracket tokens: `<@U123>` for users,
//! `<!subteam^S123>` for user groups and `<#C123>` or `<#C123|name>` for
//! channels. Any other `<...>` sequence (links, `<!here>`, ...) is left as is.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mention<'a> {
    User(&'a str),
    Subteam(&'a str),
    Channel { id: &'a str, name: Option<&'a str> },
}

fn is_id(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

fn is_user_id(s: &str) -> bool {
    s.starts_with(['U', 'W']) && s.len() > 1 && is_id(s)
}

/// Classify the contents of a single `<...>` token.
pub fn parse_mention(inner: &str) -> Option<Mention<'_>> {
    if let Some(id) = inner.strip_prefix('@') {
        return is_user_id(id).then_some(Mention::User(id));
    }

    if let Some(id) = inner.strip_prefix("!subteam^") {
        return is_id(id).then_some(Mention::Subteam(id));
    }

    let channel = inner.strip_prefix('#')?;
    match channel.split_once('|') {
        Some((id, name)) if is_id(id) && !name.is_empty() => Some(Mention::Channel {
            id,
            name: Some(name),
        }),
        Some(_) => None,
        None => is_id(channel).then_some(Mention::Channel {
            id: channel,
            name: None,
        }),
    }
}

/// Replace every recognised token with the text produced by `replace`.
pub fn rewrite<F>(text: &str, mut replace: F) -> String
where
    F: FnMut(Mention<'_>) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some((before, after)) = rest.split_once('<') {
        out.push_str(before);

        match after.split_once('>') {
            Some((inner, remainder)) => match parse_mention(inner) {
                Some(mention) => {
                    out.push_str(&replace(mention));
                    rest = remainder;
                }
                None => {
                    out.push('<');
                    rest = after;
                }
            },
            None => {
                out.push('<');
                rest = after;
                break;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(mention: Mention<'_>) -> String {
        match mention {
            Mention::User(id) => format!("[user {}]", id),
            Mention::Subteam(id) => format!("[group {}]", id),
            Mention::Channel { id, name } => format!("[channel {} {:?}]", id, name),
        }
    }

    #[test]
    fn test_parse_user() {
        assert_eq!(
            parse_mention("@U08KTGLLCLU"),
            Some(Mention::User("U08KTGLLCLU"))
        );
        assert_eq!(parse_mention("@W123"), Some(Mention::User("W123")));
        assert_eq!(parse_mention("@B123"), None);
        assert_eq!(parse_mention("@U"), None);
        assert_eq!(parse_mention("@U1|alice"), None);
    }

    #[test]
    fn test_parse_subteam() {
        assert_eq!(
            parse_mention("!subteam^S025PC88BJ5"),
            Some(Mention::Subteam("S025PC88BJ5"))
        );
        assert_eq!(parse_mention("!subteam^"), None);
        assert_eq!(parse_mention("!here"), None);
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!(
            parse_mention("#C12345678|general"),
            Some(Mention::Channel {
                id: "C12345678",
                name: Some("general")
            })
        );
        assert_eq!(
            parse_mention("#C12345678"),
            Some(Mention::Channel {
                id: "C12345678",
                name: None
            })
        );
        assert_eq!(parse_mention("#C1|"), None);
        assert_eq!(parse_mention("#c1"), None);
    }

    #[test]
    fn test_rewrite_mixed_tokens() {
        let text = "hi <@U1>, ping <!subteam^S2> in <#C3|dev> see <https://example.com|link>";
        assert_eq!(
            rewrite(text, describe),
            "hi [user U1], ping [group S2] in [channel C3 Some(\"dev\")] see <https://example.com|link>"
        );
    }

    #[test]
    fn test_rewrite_leaves_unclosed_brackets() {
        assert_eq!(rewrite("a < b <@U1", describe), "a < b <@U1");
        assert_eq!(rewrite("<<@U1>>", describe), "<[user U1]>");
    }

    #[test]
    fn test_rewrite_plain_text_unchanged() {
        assert_eq!(rewrite("no tokens here", describe), "no tokens here");
        assert_eq!(rewrite("", describe), "");
    }
}
