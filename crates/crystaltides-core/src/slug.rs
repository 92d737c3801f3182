//! URL slugs for threads and wiki articles.

fn fold_accent(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => return None,
    };
    Some(folded)
}

/// Lower-cases, strips accents, maps whitespace and `_` to `-`, drops every
/// other non-alphanumeric character and collapses repeated dashes.
///
/// ```
/// use crystaltides_core::slug::slugify;
/// assert_eq!(slugify("¿Cómo unirse al servidor?"), "como-unirse-al-servidor");
/// ```
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.trim().chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c).unwrap_or(c);
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug
}

/// A slug made unique with a numeric suffix, e.g. `reglas-del-servidor-1718000000`.
pub fn slugify_unique(input: &str, suffix: i64) -> String {
    let base = slugify(input);
    if base.is_empty() {
        suffix.to_string()
    } else {
        format!("{base}-{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn test_accents_and_punctuation() {
        assert_eq!(slugify("Guía de Construcción!!"), "guia-de-construccion");
        assert_eq!(slugify("Año nuevo: evento"), "ano-nuevo-evento");
    }

    #[test]
    fn test_collapses_separators() {
        assert_eq!(slugify("  a  --  b__c "), "a-b-c");
    }

    #[test]
    fn test_empty_and_symbols_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_unique_suffix() {
        assert_eq!(slugify_unique("Mi Hilo", 42), "mi-hilo-42");
        assert_eq!(slugify_unique("???", 42), "42");
    }
}
