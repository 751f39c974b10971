use super::catalog::Scope;

/// Longest derived description, ellipsis included
pub const DESCRIPTION_MAX_CHARS: usize = 180;

/// How many prompts a category falls back to when no defaults are authored
pub const DEFAULT_PROMPT_COUNT: usize = 5;

const ELLIPSIS: &str = "...";

/// Build the stable id of a prompt template.
///
/// Gendered ids are `{owner}-{category}-{serial}`, standalone ids are
/// `{category}-{serial}`. The serial is the authored suffix, or the positional
/// index + 1 padded to two digits when the suffix is absent or empty.
pub fn build_prompt_id(
    scope: Scope,
    owner_id: &str,
    category_id: &str,
    suffix: Option<&str>,
    index: usize,
) -> String {
    let serial = match suffix.filter(|s| !s.is_empty()) {
        Some(suffix) => suffix.to_string(),
        None => format!("{:02}", index + 1),
    };

    match scope {
        Scope::Gendered => format!("{owner_id}-{category_id}-{serial}"),
        Scope::Standalone => format!("{category_id}-{serial}"),
    }
}

/// `studio_Model_FrontPose` -> `Studio Model Frontpose`
pub fn title_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Title derived from a template name, qualified with the category label
/// unless the label already appears in it.
pub fn derive_title(name: &str, category_label: &str) -> String {
    let title = title_case(name);
    let label = category_label.trim();
    if label.is_empty() || title.to_lowercase().contains(&label.to_lowercase()) {
        return title;
    }
    format!("{title} ({label})")
}

/// First sentence of the prompt, terminated with `.` and capped at
/// [`DESCRIPTION_MAX_CHARS`] characters. A blank first sentence yields `.`.
pub fn derive_description(prompt: &str) -> String {
    let sentence = prompt.split('.').next().unwrap_or_default().trim();
    let description = format!("{sentence}.");
    if description.chars().count() <= DESCRIPTION_MAX_CHARS {
        return description;
    }

    let keep = DESCRIPTION_MAX_CHARS - ELLIPSIS.len();
    let mut truncated: String = description.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// `Flat Lay & Detail` -> `flat-lay-detail`
pub fn slugify(label: &str) -> String {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gendered_and_standalone_ids() {
        assert_eq!(
            build_prompt_id(Scope::Gendered, "male", "upper", Some("studio-front"), 3),
            "male-upper-studio-front"
        );
        assert_eq!(
            build_prompt_id(Scope::Gendered, "female", "lower", None, 0),
            "female-lower-01"
        );
        assert_eq!(
            build_prompt_id(Scope::Standalone, "hats", "hats", None, 11),
            "hats-12"
        );
        assert_eq!(
            build_prompt_id(Scope::Standalone, "bags", "bags", Some(""), 1),
            "bags-02"
        );
    }

    #[test]
    fn title_is_qualified_with_label() {
        assert_eq!(
            derive_title("Studio_Model_FrontPose", "Upper Body"),
            "Studio Model Frontpose (Upper Body)"
        );
        assert_eq!(derive_title("upper_body  close_up", "Upper Body"), "Upper Body Close Up");
        assert_eq!(derive_title("studio shot", ""), "Studio Shot");
    }

    #[test]
    fn description_takes_first_sentence() {
        assert_eq!(
            derive_description("  Bright studio shot. Second sentence."),
            "Bright studio shot."
        );
        assert_eq!(derive_description("No terminator"), "No terminator.");
        assert_eq!(derive_description(". leading dot"), ".");
    }

    #[test]
    fn long_description_is_truncated_to_limit() {
        let prompt = format!("{}. Tail.", "a".repeat(250));
        let description = derive_description(&prompt);
        assert_eq!(description.chars().count(), DESCRIPTION_MAX_CHARS);
        assert!(description.ends_with("..."));
        assert_eq!(&description[..177], "a".repeat(177));
    }

    #[test]
    fn description_at_limit_is_kept() {
        let prompt = format!("{}. Tail.", "b".repeat(179));
        let description = derive_description(&prompt);
        assert_eq!(description.chars().count(), 180);
        assert!(description.ends_with("b."));
    }

    #[test]
    fn slug_from_group_label() {
        assert_eq!(slugify("Flat Lay & Detail"), "flat-lay-detail");
        assert_eq!(slugify("Studio Editorials"), "studio-editorials");
    }
}
