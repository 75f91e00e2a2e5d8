//! Line-oriented section segmentation.
//!
//! One engine, three header vocabularies. A [`HeaderMatcher`] decides which
//! lines open a section and how header metadata is read; [`segment`] does
//! the scanning. Sections that end up with no items are discarded, and text
//! without any recognized header degrades to a flat list of lines.

use super::normalize::normalize_line;

/// A titled group of lines with optional header metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub time: Option<String>,
    pub calories: Option<u32>,
    pub focus: Option<String>,
    pub items: Vec<String>,
}

impl Section {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Header detection for one plan domain.
pub trait HeaderMatcher {
    /// Open a section if this line is a header.
    ///
    /// `raw` is the trimmed line as written; `cleaned` is its normalized form.
    fn header(&self, raw: &str, cleaned: &str) -> Option<Section>;

    /// Give the matcher a chance to consume a body line as metadata of the
    /// open section. Returns `true` if the line was consumed.
    fn annotate(&self, _section: &mut Section, _cleaned: &str) -> bool {
        false
    }

    /// Title of the group opened for body lines seen before any header.
    /// `None` drops those lines.
    fn implicit_title(&self) -> Option<&str> {
        None
    }
}

/// Result of segmenting one block of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segmented {
    /// At least one non-empty section was found.
    Grouped(Vec<Section>),
    /// No sections; every non-empty normalized line, in order.
    Ungrouped(Vec<String>),
}

/// Split `text` into sections using `matcher`.
pub fn segment(text: &str, matcher: &dyn HeaderMatcher) -> Segmented {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;
    let mut lines = Vec::new();

    for raw in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let cleaned = normalize_line(raw);
        if cleaned.is_empty() {
            continue;
        }
        lines.push(cleaned.clone());

        if let Some(section) = matcher.header(raw, &cleaned) {
            push_non_empty(&mut sections, current.replace(section));
            continue;
        }

        match current.as_mut() {
            Some(section) => {
                if !matcher.annotate(section, &cleaned) {
                    section.items.push(cleaned);
                }
            }
            None => {
                if let Some(title) = matcher.implicit_title() {
                    let mut section = Section::titled(title);
                    section.items.push(cleaned);
                    current = Some(section);
                }
            }
        }
    }
    push_non_empty(&mut sections, current);

    if sections.is_empty() {
        Segmented::Ungrouped(lines)
    } else {
        Segmented::Grouped(sections)
    }
}

fn push_non_empty(sections: &mut Vec<Section>, section: Option<Section>) {
    if let Some(section) = section.filter(|s| !s.items.is_empty()) {
        sections.push(section);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lines ending in `:` are headers; `note:` lines annotate.
    struct ColonHeaders {
        implicit: Option<&'static str>,
    }

    impl HeaderMatcher for ColonHeaders {
        fn header(&self, _raw: &str, cleaned: &str) -> Option<Section> {
            cleaned
                .strip_suffix(':')
                .map(|title| Section::titled(title.trim()))
        }

        fn annotate(&self, section: &mut Section, cleaned: &str) -> bool {
            match cleaned.strip_prefix("note ") {
                Some(note) => {
                    section.focus = Some(note.to_string());
                    true
                }
                None => false,
            }
        }

        fn implicit_title(&self) -> Option<&str> {
            self.implicit
        }
    }

    const DROP: ColonHeaders = ColonHeaders { implicit: None };

    #[test]
    fn groups_lines_under_headers() {
        let text = "A:\n• one\n• two\nB:\n- three";
        let Segmented::Grouped(sections) = segment(text, &DROP) else {
            panic!("expected groups");
        };
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "A");
        assert_eq!(sections[0].items, vec!["one", "two"]);
        assert_eq!(sections[1].items, vec!["three"]);
    }

    #[test]
    fn empty_sections_are_dropped() {
        let text = "A:\nB:\nitem\nC:";
        let Segmented::Grouped(sections) = segment(text, &DROP) else {
            panic!("expected groups");
        };
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "B");
    }

    #[test]
    fn annotation_is_not_an_item() {
        let text = "A:\nnote legs\nsquats";
        let Segmented::Grouped(sections) = segment(text, &DROP) else {
            panic!("expected groups");
        };
        assert_eq!(sections[0].focus.as_deref(), Some("legs"));
        assert_eq!(sections[0].items, vec!["squats"]);
    }

    #[test]
    fn leading_lines_dropped_or_implicit() {
        let text = "intro\nA:\nx";
        let Segmented::Grouped(dropped) = segment(text, &DROP) else {
            panic!("expected groups");
        };
        assert_eq!(dropped.len(), 1);

        let implicit = ColonHeaders {
            implicit: Some("General"),
        };
        let Segmented::Grouped(kept) = segment(text, &implicit) else {
            panic!("expected groups");
        };
        assert_eq!(kept[0].title, "General");
        assert_eq!(kept[0].items, vec!["intro"]);
        assert_eq!(kept[1].title, "A");
    }

    #[test]
    fn no_headers_degrades_to_lines() {
        let text = "  first  \n\n• second\n**\nthird";
        assert_eq!(
            segment(text, &DROP),
            Segmented::Ungrouped(vec!["first".into(), "second".into(), "third".into()])
        );
    }

    #[test]
    fn only_empty_headers_degrades_to_all_lines() {
        let text = "A:\nB:";
        assert_eq!(
            segment(text, &DROP),
            Segmented::Ungrouped(vec!["A:".into(), "B:".into()])
        );
    }
}
