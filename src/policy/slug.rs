//! Note slug assignment
//!
//! A note keeps the slug its author typed, or gets one transliterated from
//! its title. Slugs are unique across all notes.

use once_cell::sync::Lazy;
use regex::Regex;

use super::FieldError;

/// Maximum slug length, matching the `notes.slug` column
pub const MAX_SLUG_LEN: usize = 100;

/// "Enter a valid slug consisting of letters, numbers, underscores or hyphens."
pub const INVALID_SLUG_MESSAGE: &str =
    "Введите правильный слаг, состоящий из латинских букв, цифр, знаков подчеркивания или дефиса.";

/// The title produced no usable characters
pub const EMPTY_SLUG_MESSAGE: &str =
    "Не удалось составить slug из заголовка, укажите его вручную.";

/// Suffix of the duplicate-slug message; the slug itself goes in front
pub const SLUG_WARNING: &str = " - такой slug уже существует, придумайте уникальное значение!";

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w-]").expect("valid regex"));
static SLUG_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid regex"));

/// Russian and Ukrainian lowercase letters and their Latin spelling
fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' => "`",
        'ы' => "yi",
        'ь' => "'",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        'є' => "ye",
        'і' => "i",
        'ї' => "yi",
        'ґ' => "g",
        _ => return None,
    };
    Some(latin)
}

fn is_slug_source(c: char) -> bool {
    c == '-' || c.is_ascii_lowercase() || c.is_ascii_digit() || transliterate(c).is_some()
}

/// Turn arbitrary text into a URL-safe token.
///
/// `"Новый заголовок"` becomes `"novyij-zagolovok"`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase().replace("&amp;", " and ").replace('&', " and ");
    let hyphenated = SEPARATORS.replace_all(&lowered, "-");

    let mut latin = String::with_capacity(hyphenated.len());
    for c in hyphenated.chars().filter(|c| is_slug_source(*c)) {
        match transliterate(c) {
            Some(spelled) => latin.push_str(spelled),
            None => latin.push(c),
        }
    }

    // Hyphens left around dropped symbols stay, so "a — b" becomes "a--b".
    NON_WORD.replace_all(&latin, "").trim().to_string()
}

/// Slug for a note that was saved without one, cut to [`MAX_SLUG_LEN`].
pub fn derive_slug(title: &str) -> String {
    let slug = slugify(title);
    slug.chars().take(MAX_SLUG_LEN).collect()
}

/// The slug a note will be stored under: the supplied one, or one derived
/// from the title.
pub fn assign_slug(supplied: Option<&str>, title: &str) -> Result<String, FieldError> {
    match supplied {
        Some(slug) => {
            validate_format(slug)?;
            Ok(slug.to_string())
        }
        None => {
            let slug = derive_slug(title);
            if slug.is_empty() {
                Err(FieldError::new("slug", EMPTY_SLUG_MESSAGE))
            } else {
                Ok(slug)
            }
        }
    }
}

/// Reject slugs that are too long or contain characters outside
/// `[-a-zA-Z0-9_]`.
pub fn validate_format(slug: &str) -> Result<(), FieldError> {
    let len = slug.chars().count();
    if len > MAX_SLUG_LEN {
        return Err(FieldError::too_long("slug", MAX_SLUG_LEN, len));
    }
    if !SLUG_FORMAT.is_match(slug) {
        return Err(FieldError::new("slug", INVALID_SLUG_MESSAGE));
    }
    Ok(())
}

/// Validation error reported when `slug` belongs to another note
pub fn conflict(slug: &str) -> FieldError {
    FieldError::new("slug", format!("{}{}", slug, SLUG_WARNING))
}

/// Fail with [`conflict`] if `taken`.
pub fn ensure_unique(slug: &str, taken: bool) -> Result<(), FieldError> {
    if taken {
        Err(conflict(slug))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify_russian_title() {
        assert_eq!(slugify("Новый заголовок"), "novyij-zagolovok");
        assert_eq!(slugify("Заголовок"), "zagolovok");
        assert_eq!(slugify("Щука и ёж"), "schuka-i-yozh");
    }

    #[test]
    fn test_slugify_latin_and_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("Tom & Jerry"), "tom-and-jerry");
        assert_eq!(slugify("a -- b"), "a-b");
    }

    #[test]
    fn test_slugify_keeps_edge_and_double_hyphens() {
        assert_eq!(slugify("Заметка — важное"), "zametka--vazhnoe");
        assert_eq!(slugify("-Привет-"), "-privet-");
        assert_eq!(slugify("  spaced   out  "), "-spaced-out-");
        assert_eq!(slugify("Итоги: 2024"), "itogi-2024");
    }

    #[test]
    fn test_slugify_drops_soft_and_hard_signs() {
        assert_eq!(slugify("Объявление"), "obyavlenie");
        assert_eq!(slugify("Соль"), "sol");
    }

    #[test]
    fn test_slugify_ukrainian() {
        assert_eq!(slugify("Їжак і ґанок"), "yizhak-i-ganok");
        assert_eq!(slugify("Єдність"), "yednist");
    }

    #[test]
    fn test_slugify_nothing_usable() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn test_derive_slug_truncates() {
        let title = "а".repeat(150);
        assert_eq!(derive_slug(&title).chars().count(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_assign_slug_prefers_supplied() {
        assert_eq!(assign_slug(Some("my_note-1"), "Title").unwrap(), "my_note-1");
        assert_eq!(assign_slug(None, "Новый заголовок").unwrap(), "novyij-zagolovok");
    }

    #[test]
    fn test_assign_slug_rejects_bad_input() {
        let err = assign_slug(Some("не латиница"), "Title").unwrap_err();
        assert_eq!(err.field, "slug");
        assert_eq!(err.message, INVALID_SLUG_MESSAGE);

        let err = assign_slug(None, "???").unwrap_err();
        assert_eq!(err.message, EMPTY_SLUG_MESSAGE);

        let err = assign_slug(Some(&"x".repeat(101)), "Title").unwrap_err();
        assert!(err.message.contains("100"));
    }

    #[test]
    fn test_conflict_message() {
        let err = conflict("note-slug");
        assert_eq!(err.field, "slug");
        assert_eq!(
            err.message,
            "note-slug - такой slug уже существует, придумайте уникальное значение!"
        );
        assert!(ensure_unique("free", false).is_ok());
        assert_eq!(ensure_unique("note-slug", true), Err(conflict("note-slug")));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn derived_slugs_are_url_safe(title in "\\PC{0,120}") {
            let slug = derive_slug(&title);
            prop_assert!(slug.chars().count() <= MAX_SLUG_LEN);
            prop_assert!(slug.chars().all(|c| c == '-' || c == '_' || c.is_ascii_alphanumeric()));
            if !slug.is_empty() {
                prop_assert!(validate_format(&slug).is_ok());
            }
        }

        #[test]
        fn slugify_of_plain_slug_is_identity(slug in "[a-z0-9]{1,10}(-[a-z0-9]{1,10}){0,4}") {
            prop_assert_eq!(slugify(&slug), slug.clone());
        }
    }
}
