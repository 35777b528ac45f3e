const PAGE_BREAK: char = '\u{000C}';

/// Splits extracted text into trimmed, lowercased, non-empty lines.
pub fn normalize_and_split(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// True when any keyword occurs as a contiguous substring of the lowercased text.
pub fn contains_keywords(text: &str, keywords: &[&str]) -> bool {
    if text.is_empty() || keywords.is_empty() {
        return false;
    }

    let blob = text.to_lowercase();
    keywords
        .iter()
        .any(|keyword| !keyword.is_empty() && blob.contains(keyword))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLine {
    pub text: String,
    pub page: u32,
}

/// Normalized view of one extracted document: the searchable lines with
/// the page each came from, and the lowercase blob used for keyword checks.
#[derive(Debug, Clone, Default)]
pub struct NormalizedDocument {
    pub(super) lines: Vec<NormalizedLine>,
    pub(super) blob: String,
}

impl NormalizedDocument {
    pub fn from_raw(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut page = 1_u32;

        for raw_line in text.split('\n') {
            let page_breaks = raw_line.matches(PAGE_BREAK).count() as u32;
            // pdftotext emits the form feed at the start of the next page's first line
            let line_page = page + page_breaks;
            page = line_page;

            for normalized in normalize_and_split(raw_line) {
                lines.push(NormalizedLine {
                    text: normalized,
                    page: line_page,
                });
            }
        }

        let blob = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<&str>>()
            .join("\n");

        Self { lines, blob }
    }

    pub fn contains_any(&self, keywords: &[&str]) -> bool {
        contains_keywords(&self.blob, keywords)
    }

    pub fn matched_keywords<'a>(&self, keywords: &[&'a str]) -> Vec<&'a str> {
        keywords
            .iter()
            .copied()
            .filter(|keyword| !keyword.is_empty() && self.blob.contains(keyword))
            .collect()
    }

    pub fn first_line_matching(&self, keywords: &[&str]) -> Option<&NormalizedLine> {
        self.lines.iter().find(|line| {
            keywords
                .iter()
                .any(|keyword| !keyword.is_empty() && line.text.contains(keyword))
        })
    }
}
