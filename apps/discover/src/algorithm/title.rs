use once_cell::sync::Lazy;
use regex::Regex;

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("valid markup pattern"));

static BRACKET_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\[\]]*\]|【[^【】]*】").expect("valid bracket pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

const ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    // last, so "&amp;lt;" decodes to "&lt;" rather than "<"
    ("&amp;", "&"),
];

/// Delivery badges and ad labels marketplaces glue onto listing titles.
const MARKETING_NOISE: &[&str] = &[
    "무료배송",
    "당일발송",
    "당일배송",
    "오늘출발",
    "빠른배송",
    "로켓배송",
    "최저가",
    "특가",
    "광고",
    "AD",
];

/// Cleans a raw marketplace title.
///
/// Removes `<b>`-style markup remnants and `[...]`/`【...】` promo tags, decodes
/// the entities the search API emits, and collapses whitespace. With
/// `strip_marketing_noise` the fixed noise list is removed as well.
pub fn clean_title(raw: &str, strip_marketing_noise: bool) -> String {
    let without_markup = MARKUP.replace_all(raw, " ");

    let mut text = without_markup.into_owned();
    for (entity, replacement) in ENTITIES {
        text = text.replace(entity, replacement);
    }

    // decoding can reveal escaped markup
    let text = MARKUP.replace_all(&text, " ");
    let mut text = BRACKET_TAG.replace_all(&text, " ").into_owned();

    if strip_marketing_noise {
        text = text
            .split_whitespace()
            .filter(|word| !MARKETING_NOISE.contains(word))
            .collect::<Vec<_>>()
            .join(" ");
        for noise in MARKETING_NOISE.iter().filter(|n| !n.is_ascii()) {
            text = text.replace(noise, " ");
        }
    }

    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_bold_markup() {
        assert_eq!(
            clean_title("<b>강아지</b> 하네스 <b>리드줄</b>", false),
            "강아지 하네스 리드줄"
        );
    }

    #[test]
    fn test_strips_bracket_tags_and_entities() {
        assert_eq!(
            clean_title("[쿠폰할인] 고양이 &amp; 강아지 간식 【1+1】", false),
            "고양이 & 강아지 간식"
        );
    }

    #[test]
    fn test_noise_kept_unless_requested() {
        let raw = "무료배송 AD 강아지 사료 2kg 당일발송";
        assert_eq!(clean_title(raw, false), raw);
        assert_eq!(clean_title(raw, true), "강아지 사료 2kg");
    }

    #[test]
    fn test_ascii_noise_only_removed_as_whole_word() {
        assert_eq!(clean_title("ADULT 사료", true), "ADULT 사료");
    }

    #[test]
    fn test_strips_entity_escaped_markup() {
        assert_eq!(
            clean_title("&lt;b&gt;강아지&lt;/b&gt; 간식", false),
            "강아지 간식"
        );
        assert_eq!(clean_title("1 &lt; 2", false), "1 < 2");
    }

    #[test]
    fn test_garbage_input_degrades_gracefully() {
        assert_eq!(clean_title("", true), "");
        assert_eq!(clean_title("<<<>>>", true), "< >");
        assert_eq!(clean_title("[unclosed 간식", true), "[unclosed 간식");
    }
}
