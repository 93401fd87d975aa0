use tracing::debug;

use crate::slack::Reaction;
use crate::transcript::Resolver;

const SKIN_TONE_MARKER: &str = "::skin-tone-";

/// A reacting user after resolution through the users API.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionMember {
    pub id: String,
    pub handle: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReaction {
    pub name: String,
    pub members: Vec<ReactionMember>,
}

/// The name without any `::modifier` suffix (`+1::skin-tone-2` -> `+1`).
pub fn base_name(name: &str) -> &str {
    name.split_once("::").map_or(name, |(base, _)| base)
}

/// Fold skin-tone variants into their base reaction, unioning the users.
///
/// Reactions keep the order in which their base name first appears.
pub fn merge_variants(reactions: Vec<Reaction>) -> Vec<Reaction> {
    let mut merged: Vec<Reaction> = Vec::new();

    for reaction in reactions {
        let base = base_name(&reaction.name).to_string();
        let index = match merged.iter().position(|r| r.name == base) {
            Some(index) => index,
            None => {
                merged.push(Reaction {
                    name: base,
                    users: Vec::new(),
                });
                merged.len() - 1
            }
        };

        if let Some(target) = merged.get_mut(index) {
            for user in reaction.users {
                if !target.users.contains(&user) {
                    target.users.push(user);
                }
            }
        }
    }

    merged
}

/// Keep only reactions named `filter`; surrounding colons are ignored.
pub fn filter_by_name(reactions: Vec<Reaction>, filter: &str) -> Vec<Reaction> {
    let wanted = filter.trim_matches(':');
    reactions.into_iter().filter(|r| r.name == wanted).collect()
}

/// Resolve every reacting user. Users whose lookup fails are left out.
pub fn resolve_members(
    resolver: &mut Resolver<'_>,
    reactions: &[Reaction],
) -> Vec<ResolvedReaction> {
    reactions
        .iter()
        .map(|reaction| {
            let members = reaction
                .users
                .iter()
                .filter_map(|user_id| {
                    let Some(user) = resolver.user(user_id) else {
                        debug!(
                            user = %user_id,
                            reaction = %reaction.name,
                            "skipping unresolved member"
                        );
                        return None;
                    };
                    Some(ReactionMember {
                        id: user.id.clone(),
                        handle: user.handle().to_string(),
                        email: user.email().map(str::to_string),
                    })
                })
                .collect();

            ResolvedReaction {
                name: reaction.name.clone(),
                members,
            }
        })
        .collect()
}

fn member_label(member: &ReactionMember, use_email: bool) -> Option<&str> {
    if use_email {
        member.email.as_deref()
    } else {
        Some(&member.handle)
    }
}

/// One handle (or email) per line across all reactions.
pub fn render_members(reactions: &[ResolvedReaction], use_email: bool) -> String {
    let mut out = String::new();
    for member in reactions.iter().flat_map(|r| &r.members) {
        match member_label(member, use_email) {
            Some(label) => {
                out.push_str(label);
                out.push('\n');
            }
            None => debug!(user = %member.id, "member has no email address"),
        }
    }
    out
}

/// Unicode glyph for a reaction shortcode, honouring skin tones.
pub fn glyph(name: &str) -> Option<String> {
    let (shortcode, tone) = match name.split_once(SKIN_TONE_MARKER) {
        Some((shortcode, tone)) => (shortcode, tone.parse::<usize>().ok()),
        None => (name, None),
    };

    let emoji = emojis::get_by_shortcode(shortcode)?;
    let Some(tone) = tone.filter(|t| *t > 0) else {
        return Some(emoji.to_string());
    };

    let skinned = emoji
        .skin_tones()
        .and_then(|mut tones| tones.nth(tone - 1))
        .unwrap_or(emoji);
    Some(skinned.to_string())
}

/// Per reaction a `:name: <glyph> (<count>)` line followed by its members.
pub fn render_summary(reactions: &[ResolvedReaction], use_email: bool) -> String {
    let mut out = String::new();

    for reaction in reactions {
        out.push_str(&format!(":{}:", reaction.name));
        if let Some(glyph) = glyph(&reaction.name) {
            out.push(' ');
            out.push_str(&glyph);
        }
        out.push_str(&format!(" ({})\n", reaction.members.len()));

        for member in &reaction.members {
            if let Some(label) = member_label(member, use_email) {
                out.push_str("  ");
                out.push_str(label);
                out.push('\n');
            }
        }
    }

    out
}
