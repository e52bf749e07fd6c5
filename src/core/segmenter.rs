use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Point limits used when grouping a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmenterOptions {
    /// Number of leading points promoted to main points
    pub max_main_points: usize,

    /// Positional offsets after a main point that become its sub points (1..=n)
    pub max_sub_points: usize,
}

impl Default for SegmenterOptions {
    fn default() -> Self {
        Self {
            max_main_points: 4,
            max_sub_points: 2,
        }
    }
}

/// Two-level grouping of a summary's points
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    /// Every unique normalized point, in first-seen order
    pub points: Vec<String>,

    /// Leading points that become children of the root
    pub main_points: Vec<String>,

    /// Children of each main point
    pub sub_points: BTreeMap<String, Vec<String>>,
}

impl Hierarchy {
    /// Sub points of `main_point`, empty when it has none
    pub fn subs_of(&self, main_point: &str) -> &[String] {
        self.sub_points
            .get(main_point)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.main_points.is_empty()
    }
}

/// Splits raw summary text into unique points and groups them
pub struct Segmenter {
    /// Line break, dash bullet, or bullet glyph
    delimiter_regex: Regex,
    options: SegmenterOptions,
}

impl Segmenter {
    pub fn new(options: SegmenterOptions) -> Self {
        Self {
            delimiter_regex: Regex::new(r"\n|- |\u{2022}")
                .expect("Invalid delimiter regex"),
            options,
        }
    }

    /// Normalized, deduplicated fragments of `raw_text` in original order
    pub fn points(&self, raw_text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut points = Vec::new();

        for fragment in self.delimiter_regex.split(raw_text) {
            let point = normalize_point(fragment);
            if !point.is_empty() && seen.insert(point.clone()) {
                points.push(point);
            }
        }

        points
    }

    /// Group `raw_text` into main points and their positional sub points.
    ///
    /// Never fails: empty or blank input yields an empty hierarchy.
    pub fn segment(&self, raw_text: &str) -> Hierarchy {
        let points = self.points(raw_text);
        let main_points: Vec<String> = points
            .iter()
            .take(self.options.max_main_points)
            .cloned()
            .collect();

        let mut sub_points = BTreeMap::new();
        // Main points are a prefix of `points`, so the enumeration index is the point's index.
        for (index, point) in main_points.iter().enumerate() {
            let subs: Vec<String> = points
                .iter()
                .skip(index + 1)
                .take(self.options.max_sub_points)
                .filter(|candidate| *candidate != point)
                .cloned()
                .collect();
            sub_points.insert(point.clone(), subs);
        }

        Hierarchy {
            points,
            main_points,
            sub_points,
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(SegmenterOptions::default())
    }
}

/// Trim whitespace, drop trailing periods, and uppercase the first character.
///
/// The remainder of the text keeps its case.
pub fn normalize_point(fragment: &str) -> String {
    let trimmed = fragment
        .trim()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace());

    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mixed_delimiters_and_duplicates() {
        let segmenter = Segmenter::default();
        let hierarchy = segmenter.segment("Point one.\n- Point two\n• Point one.\nPoint three");

        assert_eq!(hierarchy.points, strings(&["Point one", "Point two", "Point three"]));
        assert_eq!(hierarchy.main_points, hierarchy.points);
        assert_eq!(hierarchy.subs_of("Point one"), strings(&["Point two", "Point three"]).as_slice());
        assert_eq!(hierarchy.subs_of("Point two"), strings(&["Point three"]).as_slice());
        assert!(hierarchy.subs_of("Point three").is_empty());
        assert_eq!(hierarchy.sub_points.len(), 3);
    }

    #[test]
    fn test_empty_input_gives_empty_hierarchy() {
        let hierarchy = Segmenter::default().segment("");
        assert!(hierarchy.points.is_empty());
        assert!(hierarchy.main_points.is_empty());
        assert!(hierarchy.sub_points.is_empty());
        assert!(hierarchy.is_empty());

        let blank = Segmenter::default().segment("  \n - \n•\n...");
        assert!(blank.is_empty());
    }

    #[test]
    fn test_five_points_caps_main_points_at_four() {
        let hierarchy = Segmenter::default().segment("A\nB\nC\nD\nE");

        assert_eq!(hierarchy.main_points, strings(&["A", "B", "C", "D"]));
        assert_eq!(hierarchy.subs_of("C"), strings(&["D", "E"]).as_slice());
        assert_eq!(hierarchy.subs_of("D"), strings(&["E"]).as_slice());
        assert!(hierarchy.subs_of("E").is_empty());
        assert!(!hierarchy.sub_points.contains_key("E"));
    }

    #[test]
    fn test_identical_fragments_collapse_to_one_point() {
        let hierarchy = Segmenter::default().segment("same.\n- same\n• Same.\nsame  ");

        assert_eq!(hierarchy.points, strings(&["Same"]));
        assert_eq!(hierarchy.main_points, strings(&["Same"]));
        assert!(hierarchy.subs_of("Same").is_empty());
    }

    #[test]
    fn test_sub_points_may_repeat_other_main_points() {
        let hierarchy = Segmenter::default().segment("a\nb\nc");

        assert_eq!(hierarchy.subs_of("A"), strings(&["B", "C"]).as_slice());
        assert!(hierarchy.main_points.contains(&"B".to_string()));
        assert_eq!(hierarchy.subs_of("B"), strings(&["C"]).as_slice());
    }

    #[test]
    fn test_normalization_keeps_rest_of_case() {
        assert_eq!(normalize_point("  hello World.  "), "Hello World");
        assert_eq!(normalize_point("iPhone launch"), "IPhone launch");
        assert_eq!(normalize_point("wait..."), "Wait");
        assert_eq!(normalize_point("ümlaut"), "Ümlaut");
        assert_eq!(normalize_point("   "), "");
        assert_eq!(normalize_point("."), "");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let samples = [
            "",
            "  plain text ",
            "ends with dot.",
            "dots and space . .",
            "**bold** item",
            "ßtraße",
            "ŉ apostrophe",
            "\t tabbed.\t",
            "1. numbered",
        ];

        for sample in samples {
            let once = normalize_point(sample);
            assert_eq!(normalize_point(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_points_are_pairwise_distinct() {
        let text = "x\n- y\n• x.\nz\n- y.\n• w\nz";
        let points = Segmenter::default().points(text);
        let unique: HashSet<_> = points.iter().collect();
        assert_eq!(unique.len(), points.len());
        assert_eq!(points, strings(&["X", "Y", "Z", "W"]));
    }

    #[test]
    fn test_sub_points_follow_positional_offsets() {
        let text = "one\ntwo\nthree\nfour\nfive\nsix\nseven";
        let hierarchy = Segmenter::default().segment(text);

        for (index, main) in hierarchy.main_points.iter().enumerate() {
            assert_eq!(&hierarchy.points[index], main);
            let subs = hierarchy.subs_of(main);
            assert!(subs.len() <= 2);
            assert!(!subs.contains(main));
            for (offset, sub) in subs.iter().enumerate() {
                assert_eq!(sub, &hierarchy.points[index + offset + 1]);
            }
        }
    }

    #[test]
    fn test_dash_without_space_is_not_a_delimiter() {
        let points = Segmenter::default().points("well-known fact\n-tight");
        assert_eq!(points, strings(&["Well-known fact", "-tight"]));
    }

    #[test]
    fn test_huge_sub_point_limit_is_bounded_by_points() {
        let segmenter = Segmenter::new(SegmenterOptions {
            max_main_points: usize::MAX,
            max_sub_points: usize::MAX,
        });

        let started = std::time::Instant::now();
        let hierarchy = segmenter.segment("a\nb\nc");

        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(hierarchy.main_points, strings(&["A", "B", "C"]));
        assert_eq!(hierarchy.subs_of("A"), strings(&["B", "C"]).as_slice());
        assert_eq!(hierarchy.subs_of("B"), strings(&["C"]).as_slice());
        assert!(hierarchy.subs_of("C").is_empty());
    }

    #[test]
    fn test_custom_limits() {
        let segmenter = Segmenter::new(SegmenterOptions {
            max_main_points: 2,
            max_sub_points: 1,
        });
        let hierarchy = segmenter.segment("a\nb\nc\nd");

        assert_eq!(hierarchy.main_points, strings(&["A", "B"]));
        assert_eq!(hierarchy.subs_of("A"), strings(&["B"]).as_slice());
        assert_eq!(hierarchy.subs_of("B"), strings(&["C"]).as_slice());
    }
}
