//! Text layout of a single page face.
//!
//! A face is laid out top to bottom as: title (bold), a blank line, the body
//! word-wrapped to the column width, an `[image: ...]` caption when the page
//! carries one, and the page number pinned to the last row on the outer edge
//! (left for a verso, right for a recto). Rows that do not fit are dropped
//! from the body first; the footer always survives when there are at least
//! two rows.

use crate::{CellFlags, Frame, cluster_width, text_width};
use core_book::{Face, FaceSide};
use core_content::{Page, sanitize};
use unicode_segmentation::UnicodeSegmentation;

/// Sanitised, size-independent face ready to be laid out at any width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacePlate {
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub number: u32,
    pub side: FaceSide,
}

impl FacePlate {
    pub fn from_face(face: Face<'_, Page>) -> Self {
        let (title, body, image) = match face.content {
            Some(page) => (
                sanitize(&page.title).replace('\n', " "),
                sanitize(&page.text),
                page.image.as_deref().map(sanitize),
            ),
            None => (String::new(), String::new(), None),
        };
        Self {
            title,
            body,
            image,
            number: face.number,
            side: face.side,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.title.is_empty() && self.body.trim().is_empty() && self.image.is_none()
    }

    /// Lines to draw for a `width` x `height` box, footer last.
    pub fn layout(&self, width: u16, height: u16) -> Vec<(String, CellFlags)> {
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let mut lines: Vec<(String, CellFlags)> = Vec::new();
        if !self.title.is_empty() {
            for line in wrap(&self.title, width) {
                lines.push((line, CellFlags::BOLD));
            }
            lines.push((String::new(), CellFlags::empty()));
        }
        for line in wrap(&self.body, width) {
            lines.push((line, CellFlags::empty()));
        }
        if let Some(image) = &self.image {
            lines.push((String::new(), CellFlags::empty()));
            for line in wrap(&format!("[image: {image}]"), width) {
                lines.push((line, CellFlags::DIM));
            }
        }

        let footer = self.footer(width);
        if height == 1 {
            return vec![footer];
        }
        lines.truncate(height as usize - 1);
        while lines.len() < height as usize - 1 {
            lines.push((String::new(), CellFlags::empty()));
        }
        lines.push(footer);
        lines
    }

    fn footer(&self, width: u16) -> (String, CellFlags) {
        let number = self.number.to_string();
        let pad = width.saturating_sub(text_width(&number)) as usize;
        let line = match self.side {
            FaceSide::Left => number,
            FaceSide::Right => format!("{}{}", " ".repeat(pad), number),
        };
        (line, CellFlags::DIM)
    }

    /// Draw into `frame` at (x,y) within a `width` x `height` box.
    pub fn draw(&self, frame: &mut Frame, x: u16, y: u16, width: u16, height: u16, extra: CellFlags) {
        frame.clear_rect(x, y, width, height, extra);
        for (row, (line, flags)) in self.layout(width, height).into_iter().enumerate() {
            frame.put_str(x, y + row as u16, &line, width, flags | extra);
        }
    }
}

/// Greedy word wrap by display width. Explicit newlines start a new line;
/// words wider than `width` are hard-broken on cluster boundaries.
pub fn wrap(text: &str, width: u16) -> Vec<String> {
    let mut out = Vec::new();
    if width == 0 {
        return out;
    }
    // Widths are summed as usize: a single word can already saturate u16.
    let width = usize::from(width);
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_w = 0usize;
        for word in paragraph.split_whitespace() {
            let word_w = usize::from(text_width(word));
            let sep = if line.is_empty() { 0 } else { 1 };
            if line_w + sep + word_w <= width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                line_w += sep + word_w;
                continue;
            }
            if !line.is_empty() {
                out.push(std::mem::take(&mut line));
                line_w = 0;
            }
            if word_w <= width {
                line.push_str(word);
                line_w = word_w;
                continue;
            }
            for g in word.graphemes(true) {
                let w = usize::from(cluster_width(g));
                if line_w + w > width && !line.is_empty() {
                    out.push(std::mem::take(&mut line));
                    line_w = 0;
                }
                line.push_str(g);
                line_w += w;
            }
        }
        out.push(line);
    }
    // A trailing empty paragraph carries no content.
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plate(side: FaceSide) -> FacePlate {
        FacePlate {
            title: "Chapter 3".into(),
            body: "Page three sits on the right.".into(),
            image: None,
            number: 3,
            side,
        }
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
    }

    #[test]
    fn hard_breaks_long_words() {
        assert_eq!(wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn keeps_paragraph_breaks() {
        assert_eq!(wrap("one\n\ntwo\n", 10), vec!["one", "", "two"]);
    }

    #[test]
    fn footer_on_outer_edge() {
        let right = plate(FaceSide::Right).layout(12, 6);
        assert_eq!(right.len(), 6);
        assert_eq!(right[5].0, "           3");
        let left = plate(FaceSide::Left).layout(12, 6);
        assert_eq!(left[5].0, "3");
        assert_eq!(left[0], ("Chapter 3".to_string(), CellFlags::BOLD));
    }

    #[test]
    fn body_dropped_before_footer() {
        let lines = plate(FaceSide::Right).layout(8, 3);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].0, "Chapter");
        assert!(lines[2].0.ends_with('3'));
    }

    #[test]
    fn blank_face_from_missing_content() {
        let face: Face<'_, Page> = Face {
            content: None,
            number: 6,
            side: FaceSide::Left,
        };
        let plate = FacePlate::from_face(face);
        assert!(plate.is_blank());
        assert_eq!(plate.layout(5, 2)[1].0, "6");
    }

    #[test]
    fn image_caption_and_sanitised_text() {
        let page = Page::new("T\u{1b}[2J", "body\tline").with_image("g/1.png");
        let plate = FacePlate::from_face(Face {
            content: Some(&page),
            number: 1,
            side: FaceSide::Right,
        });
        assert_eq!(plate.title, "T[2J");
        assert_eq!(plate.body, "body line");
        let lines = plate.layout(20, 8);
        assert!(lines.iter().any(|(l, f)| l == "[image: g/1.png]" && *f == CellFlags::DIM));
    }

    #[test]
    fn oversized_word_after_another_word_is_hard_broken() {
        let page = Page::new("T", format!("a {}", "b".repeat(70_000)));
        let plate = FacePlate::from_face(Face {
            content: Some(&page),
            number: 1,
            side: FaceSide::Right,
        });
        let lines = plate.layout(30, 10);
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[2].0, "a");
        assert_eq!(lines[3].0, "b".repeat(30));
        assert!(lines[9].0.ends_with('1'));

        let wrapped = wrap(&format!("x {}", "y".repeat(70_000)), 40_000);
        assert_eq!(wrapped.len(), 3);
        assert_eq!(wrapped[0], "x");
        assert_eq!(text_width(&wrapped[1]), 40_000);
    }
}
