use poise::serenity_prelude as serenity;
use serenity::builder::CreateEmbed;
use serenity::model::colour::Colour;
use serenity::model::mention::Mentionable;

use super::error::AppearanceError;
use super::mapping::RoleMapping;

pub const TITLE_LIMIT: usize = 256;
pub const DESCRIPTION_LIMIT: usize = 4096;

const NAMED_COLOURS: &[(&str, u32)] = &[
    ("white", 0xFFFFFF),
    ("aqua", 0x1ABC9C),
    ("green", 0x57F287),
    ("blue", 0x3498DB),
    ("yellow", 0xFEE75C),
    ("purple", 0x9B59B6),
    ("pink", 0xE91E63),
    ("fuchsia", 0xEB459E),
    ("gold", 0xF1C40F),
    ("orange", 0xE67E22),
    ("red", 0xED4245),
    ("grey", 0x95A5A6),
    ("gray", 0x95A5A6),
    ("navy", 0x34495E),
    ("blurple", 0x5865F2),
    ("black", 0x23272A),
];

/// Everything about the announcement that isn't a mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Appearance {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `None` picks a random colour when the embed is built
    pub colour: Option<Colour>,
}

fn is_none_keyword(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("none")
}

/// `none` (any case) leaves the field out.
pub fn parse_optional_text(input: &str, limit: usize) -> Result<Option<String>, AppearanceError> {
    let text = input.trim();
    if is_none_keyword(text) || text.is_empty() {
        return Ok(None);
    }
    if text.chars().count() > limit {
        return Err(AppearanceError::TooLong { limit });
    }
    Ok(Some(text.to_string()))
}

pub fn parse_colour(input: &str) -> Result<Option<Colour>, AppearanceError> {
    let text = input.trim();
    if is_none_keyword(text) {
        return Ok(None);
    }

    let name: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect::<String>()
        .to_lowercase();
    if let Some((_, value)) = NAMED_COLOURS.iter().find(|(n, _)| *n == name) {
        return Ok(Some(Colour::new(*value)));
    }

    let hex = text
        .strip_prefix('#')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        if let Ok(value) = u32::from_str_radix(hex, 16) {
            return Ok(Some(Colour::new(value)));
        }
    }

    Err(AppearanceError::InvalidColour(text.to_string()))
}

pub fn random_colour() -> Colour {
    Colour::new(rand::random::<u32>() & 0xFFFFFF)
}

pub fn build_embed(appearance: &Appearance, mappings: &[RoleMapping]) -> CreateEmbed {
    let mut embed = CreateEmbed::new().colour(appearance.colour.unwrap_or_else(random_colour));

    if let Some(title) = &appearance.title {
        embed = embed.title(title);
    }
    if let Some(description) = &appearance.description {
        embed = embed.description(description);
    }

    embed.fields(
        mappings
            .iter()
            .map(|m| (m.emoji.to_string(), m.role_id.mention().to_string(), true)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction_roles::emoji::parse_emoji;
    use ::serenity::model::id::RoleId;

    #[test]
    fn test_optional_text() {
        assert_eq!(parse_optional_text("  Pick roles ", TITLE_LIMIT), Ok(Some("Pick roles".to_string())));
        assert_eq!(parse_optional_text("NONE", TITLE_LIMIT), Ok(None));
        assert_eq!(parse_optional_text("none ", TITLE_LIMIT), Ok(None));
        assert_eq!(
            parse_optional_text(&"a".repeat(TITLE_LIMIT + 1), TITLE_LIMIT),
            Err(AppearanceError::TooLong { limit: TITLE_LIMIT })
        );
    }

    #[test]
    fn test_parse_colour() {
        assert_eq!(parse_colour("#00FF00"), Ok(Some(Colour::new(0x00FF00))));
        assert_eq!(parse_colour("ff8800"), Ok(Some(Colour::new(0xFF8800))));
        assert_eq!(parse_colour("0x123456"), Ok(Some(Colour::new(0x123456))));
        assert_eq!(parse_colour("Blurple"), Ok(Some(Colour::new(0x5865F2))));
        assert_eq!(parse_colour("none"), Ok(None));
        assert_eq!(
            parse_colour("#GGGGGG"),
            Err(AppearanceError::InvalidColour("#GGGGGG".to_string()))
        );
        assert!(parse_colour("#FFF").is_err());
    }

    #[test]
    fn test_random_colour_is_rgb() {
        for _ in 0..32 {
            assert!(random_colour().0 <= 0xFFFFFF);
        }
    }

    #[test]
    fn test_build_embed() {
        let appearance = Appearance {
            title: Some("Roles".to_string()),
            description: None,
            colour: Some(Colour::new(0x00FF00)),
        };
        let mappings = vec![RoleMapping {
            emoji: parse_emoji("😄").unwrap(),
            role_id: RoleId::new(10),
            role_name: "Gamer".to_string(),
        }];

        let json = serde_json::to_value(build_embed(&appearance, &mappings)).unwrap();
        assert_eq!(json["title"], "Roles");
        assert_eq!(json["color"], 0x00FF00);
        assert!(json.get("description").map_or(true, |d| d.is_null()));
        assert_eq!(json["fields"][0]["name"], "😄");
        assert_eq!(json["fields"][0]["value"], "<@&10>");
        assert_eq!(json["fields"][0]["inline"], true);
    }
}
