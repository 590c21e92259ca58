//! Overwrites the text of numbered `<tspan>` elements in an SVG card.
//!
//! Elements are addressed by their position among all `tspan` elements in
//! document order, nested ones included. Only the text directly following
//! the opening tag is replaced; markup is left byte-for-byte untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Errors returned while rewriting a card.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("template has {found} tspan elements, element {index} is required")]
    MissingElement { index: usize, found: usize },
    #[error("tspan element {index} is self-closing and has no text to replace")]
    EmptyElement { index: usize },
}

/// Values substituted into the card, already formatted for display.
#[derive(Debug, Clone, Default)]
pub struct CardValues {
    pub age: String,
    pub repos: String,
    pub contributed: String,
    pub commits: String,
    pub stars: String,
    pub followers: String,
    pub loc_net: String,
    pub loc_added: String,
    pub loc_deleted: String,
}

impl CardValues {
    /// Element index and replacement text for each value.
    fn placements(&self) -> Vec<(usize, String)> {
        vec![
            (31, self.age.clone()),
            (67, self.repos.clone()),
            (69, self.contributed.clone()),
            (71, self.commits.clone()),
            (73, self.stars.clone()),
            (75, self.followers.clone()),
            (77, self.loc_net.clone()),
            (78, format!("{}++", self.loc_added)),
            (79, format!("{}--", self.loc_deleted)),
        ]
    }
}

fn tspan_regex() -> &'static Regex {
    static TSPAN: OnceLock<Regex> = OnceLock::new();
    TSPAN.get_or_init(|| {
        Regex::new(r"<tspan(?:\s[^>]*)?/?>([^<]*)").expect("tspan pattern is valid")
    })
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape_text(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Text of every `tspan` in document order; `None` for self-closing ones.
pub fn tspan_texts(svg: &str) -> Vec<Option<String>> {
    tspan_regex()
        .captures_iter(svg)
        .map(|caps| {
            let (whole, inner) = (caps.get(0)?, caps.get(1)?);
            if svg[whole.start()..inner.start()].ends_with("/>") {
                None
            } else {
                Some(unescape_text(inner.as_str()))
            }
        })
        .collect()
}

/// Replace the text of the given `tspan` elements.
pub fn overwrite_tspans(svg: &str, placements: &[(usize, String)]) -> Result<String, RenderError> {
    let elements: Vec<_> = tspan_regex().captures_iter(svg).collect();

    let mut edits = Vec::with_capacity(placements.len());
    for (index, text) in placements {
        let caps = elements.get(*index).ok_or(RenderError::MissingElement {
            index: *index,
            found: elements.len(),
        })?;
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            return Err(RenderError::EmptyElement { index: *index });
        };
        if svg[whole.start()..inner.start()].ends_with("/>") {
            return Err(RenderError::EmptyElement { index: *index });
        }
        edits.push((inner.range(), escape_text(text)));
    }
    edits.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(svg.len());
    let mut last = 0;
    for (range, text) in edits {
        out.push_str(&svg[last..range.start]);
        out.push_str(&text);
        last = range.end;
    }
    out.push_str(&svg[last..]);
    Ok(out)
}

/// Rewrite the card at `path` in place.
pub fn overwrite_card(path: &Path, values: &CardValues) -> Result<(), RenderError> {
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    let svg = fs::read_to_string(path).map_err(io_err)?;
    let updated = overwrite_tspans(&svg, &values.placements())?;
    fs::write(path, updated).map_err(io_err)?;
    log::debug!("Updated {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SVG: &str = r#"<svg><text><tspan x="1">a</tspan><tspan class="v">b<tspan>c</tspan></tspan><tspan/></text></svg>"#;

    #[test]
    fn lists_texts_in_document_order() {
        assert_eq!(
            tspan_texts(SVG),
            vec![
                Some("a".to_string()),
                Some("b".to_string()),
                Some("c".to_string()),
                None
            ]
        );
    }

    #[test]
    fn replaces_only_targeted_text() {
        let placements = [(2, "C".to_string()), (0, "A & B".to_string())];
        let out = overwrite_tspans(SVG, &placements).unwrap();
        assert_eq!(
            out,
            r#"<svg><text><tspan x="1">A &amp; B</tspan><tspan class="v">b<tspan>C</tspan></tspan><tspan/></text></svg>"#
        );
    }

    #[test]
    fn missing_element_is_an_error() {
        let err = overwrite_tspans(SVG, &[(9, "x".to_string())]).unwrap_err();
        assert!(matches!(err, RenderError::MissingElement { index: 9, found: 4 }));
    }

    #[test]
    fn self_closing_element_is_an_error() {
        let err = overwrite_tspans(SVG, &[(3, "x".to_string())]).unwrap_err();
        assert!(matches!(err, RenderError::EmptyElement { index: 3 }));
    }

    #[test]
    fn overwrite_card_fills_fixed_positions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("card.svg");
        let body: String = (0..80).map(|i| format!("<tspan>{}</tspan>", i)).collect();
        fs::write(&path, format!("<svg><text>{}</text></svg>", body)).unwrap();

        let values = CardValues {
            age: "22 years, 10 months, 20 days".to_string(),
            commits: "1,234  ".to_string(),
            loc_net: "71".to_string(),
            loc_added: "113".to_string(),
            loc_deleted: "42".to_string(),
            ..CardValues::default()
        };
        overwrite_card(&path, &values).unwrap();

        let texts = tspan_texts(&fs::read_to_string(&path).unwrap());
        assert_eq!(texts[31].as_deref(), Some("22 years, 10 months, 20 days"));
        assert_eq!(texts[71].as_deref(), Some("1,234  "));
        assert_eq!(texts[78].as_deref(), Some("113++"));
        assert_eq!(texts[79].as_deref(), Some("42--"));
        assert_eq!(texts[30].as_deref(), Some("30"));
    }
}
