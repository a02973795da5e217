use poise::serenity_prelude as serenity;
use serenity::model::channel::ReactionType;
use serenity::model::id::EmojiId;

use super::error::MappingError;

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Parses the emoji half of a mapping message.
///
/// Custom emoji arrive as `<:name:id>` (or `<a:name:id>` when animated), unicode
/// emoji as the raw characters. Plain ASCII words are refused since they are
/// almost always a role name typed without an emoji in front.
pub fn parse_emoji(token: &str) -> Result<ReactionType, MappingError> {
    let invalid = || MappingError::InvalidEmoji(token.to_string());

    if token.is_empty() || (token.is_ascii() && !token.starts_with('<')) {
        return Err(invalid());
    }

    match ReactionType::try_from(token).map_err(|_| invalid())? {
        ReactionType::Custom { name, .. } if name.as_deref().is_none_or(str::is_empty) => {
            Err(invalid())
        }
        emoji => Ok(emoji),
    }
}

/// What two reactions must share to count as "the same emoji".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EmojiKey {
    Custom(EmojiId),
    Unicode(String),
}

impl From<&ReactionType> for EmojiKey {
    fn from(reaction: &ReactionType) -> Self {
        match reaction {
            ReactionType::Custom { id, .. } => EmojiKey::Custom(*id),
            ReactionType::Unicode(text) => EmojiKey::Unicode(
                text.chars().filter(|c| *c != VARIATION_SELECTOR).collect(),
            ),
            other => EmojiKey::Unicode(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unicode() {
        let emoji = parse_emoji("😄").unwrap();
        assert_eq!(emoji, ReactionType::Unicode("😄".to_string()));
    }

    #[test]
    fn test_parse_custom() {
        let emoji = parse_emoji("<:custom:123456>").unwrap();
        match emoji {
            ReactionType::Custom { id, name, animated } => {
                assert_eq!(id, EmojiId::new(123456));
                assert_eq!(name.as_deref(), Some("custom"));
                assert!(!animated);
            }
            other => panic!("expected custom emoji, got {other:?}"),
        }

        assert!(matches!(
            parse_emoji("<a:dance:42>").unwrap(),
            ReactionType::Custom { animated: true, .. }
        ));
    }

    #[test]
    fn test_reject_words() {
        assert_eq!(
            parse_emoji("Member"),
            Err(MappingError::InvalidEmoji("Member".to_string()))
        );
        assert!(parse_emoji("").is_err());
        assert!(parse_emoji("<:broken").is_err());
    }

    #[test]
    fn test_reject_custom_without_name() {
        assert_eq!(
            parse_emoji("<::5>"),
            Err(MappingError::InvalidEmoji("<::5>".to_string()))
        );
        assert!(parse_emoji("<a::5>").is_err());
    }

    #[test]
    fn test_key_ignores_variation_selector() {
        let plain = ReactionType::Unicode("\u{2764}".to_string());
        let styled = ReactionType::Unicode("\u{2764}\u{FE0F}".to_string());
        assert_eq!(EmojiKey::from(&plain), EmojiKey::from(&styled));
    }

    #[test]
    fn test_custom_key_ignores_name() {
        let a = parse_emoji("<:old_name:77>").unwrap();
        let b = parse_emoji("<:new_name:77>").unwrap();
        assert_eq!(EmojiKey::from(&a), EmojiKey::from(&b));
        assert_eq!(EmojiKey::from(&a), EmojiKey::Custom(EmojiId::new(77)));
    }
}
