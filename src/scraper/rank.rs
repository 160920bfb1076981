//! Filter, rank and truncate extracted papers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{Paper, RankedPaper, RankedResult};

/// How the start date applies once scrolling is done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CutoffPolicy {
    /// The start date only stops scrolling; every dated paper is ranked.
    #[default]
    HaltOnly,
    /// Papers dated on or before the start date are also dropped.
    Exclude,
}

impl CutoffPolicy {
    /// Parse from string (for CLI/env var).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "haltonly" | "halt" => Some(Self::HaltOnly),
            "exclude" => Some(Self::Exclude),
            _ => None,
        }
    }

    fn admits(&self, published: NaiveDate, start_date: NaiveDate) -> bool {
        match self {
            Self::HaltOnly => true,
            Self::Exclude => published > start_date,
        }
    }
}

impl std::fmt::Display for CutoffPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HaltOnly => write!(f, "halt-only"),
            Self::Exclude => write!(f, "exclude"),
        }
    }
}

impl std::str::FromStr for CutoffPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s).ok_or_else(|| {
            format!(
                "Invalid cutoff policy '{}'. Valid options: halt-only, exclude",
                s
            )
        })
    }
}

/// Sort by stars descending, keeping encounter order for ties, and keep the
/// first `top_n`.
pub fn top_by_stars<T>(mut items: Vec<T>, top_n: usize, stars: impl Fn(&T) -> u64) -> Vec<T> {
    // sort_by is stable
    items.sort_by(|a, b| stars(b).cmp(&stars(a)));
    items.truncate(top_n);
    items
}

/// Rank papers for output. Undated papers are never eligible.
pub fn select(
    papers: Vec<Paper>,
    start_date: NaiveDate,
    top_n: usize,
    policy: CutoffPolicy,
) -> RankedResult {
    let total = papers.len();
    let candidates: Vec<Paper> = papers
        .into_iter()
        .filter(|paper| match paper.published {
            Some(published) => policy.admits(published, start_date),
            None => false,
        })
        .collect();
    debug!(
        total,
        eligible = candidates.len(),
        policy = %policy,
        "Filtered papers for ranking"
    );

    let candidate_count = candidates.len();
    let papers = top_by_stars(candidates, top_n, |p| p.stars)
        .into_iter()
        .map(RankedPaper::from)
        .collect();

    RankedResult {
        papers,
        requested: top_n,
        candidates: candidate_count,
        stop: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 4).unwrap()
    }

    fn paper(title: &str, stars: u64, published: Option<NaiveDate>) -> Paper {
        Paper {
            stars,
            title: title.to_string(),
            published,
            link: format!("https://paperswithcode.com/paper/{}", title),
        }
    }

    fn titles(result: &RankedResult) -> Vec<&str> {
        result.papers.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn test_top_two_by_stars() {
        let papers = vec![
            paper("five", 5, date(2025, 2, 1)),
            paper("fifty", 50, date(2025, 2, 2)),
            paper("ten", 10, date(2025, 2, 3)),
        ];

        let result = select(papers, cutoff(), 2, CutoffPolicy::HaltOnly);

        assert_eq!(titles(&result), vec!["fifty", "ten"]);
        assert_eq!(result.papers[0].stars, 50);
        assert_eq!(result.papers[1].stars, 10);
        assert!(!result.is_partial());
    }

    #[test]
    fn test_ties_keep_page_order() {
        let papers = vec![
            paper("first", 7, date(2025, 2, 1)),
            paper("big", 9, date(2025, 2, 1)),
            paper("second", 7, date(2025, 2, 1)),
            paper("third", 7, date(2025, 2, 1)),
        ];

        let result = select(papers, cutoff(), 10, CutoffPolicy::HaltOnly);

        assert_eq!(titles(&result), vec!["big", "first", "second", "third"]);
    }

    #[test]
    fn test_undated_papers_never_rank() {
        let papers = vec![
            paper("undated", 1_000_000, None),
            paper("dated", 1, date(2025, 2, 1)),
        ];

        let result = select(papers, cutoff(), 10, CutoffPolicy::HaltOnly);

        assert_eq!(titles(&result), vec!["dated"]);
        assert_eq!(result.candidates, 1);
    }

    #[test]
    fn test_halt_only_keeps_old_papers() {
        let papers = vec![
            paper("old", 100, date(2024, 12, 30)),
            paper("new", 1, date(2025, 2, 1)),
        ];

        let result = select(papers, cutoff(), 10, CutoffPolicy::HaltOnly);

        assert_eq!(titles(&result), vec!["old", "new"]);
    }

    #[test]
    fn test_exclude_drops_papers_on_or_before_cutoff() {
        let papers = vec![
            paper("old", 100, date(2024, 12, 30)),
            paper("boundary", 50, date(2025, 1, 4)),
            paper("new", 1, date(2025, 1, 5)),
        ];

        let result = select(papers, cutoff(), 10, CutoffPolicy::Exclude);

        assert_eq!(titles(&result), vec!["new"]);
    }

    #[test]
    fn test_length_bounded_by_inputs_and_top_n() {
        for top_n in 0..6 {
            let papers: Vec<Paper> = (0..3)
                .map(|i| paper(&format!("p{}", i), i * 3, date(2025, 2, 1)))
                .collect();
            let result = select(papers, cutoff(), top_n, CutoffPolicy::HaltOnly);
            assert!(result.len() <= top_n.min(3));
            assert_eq!(result.is_partial(), top_n > 3);
        }
    }

    #[test]
    fn test_reranking_output_is_idempotent() {
        let papers = vec![
            paper("a", 3, date(2025, 2, 1)),
            paper("b", 8, date(2025, 2, 1)),
            paper("c", 3, date(2025, 2, 1)),
            paper("d", 1, date(2025, 2, 1)),
            paper("e", 8, date(2025, 2, 1)),
        ];

        let once = select(papers, cutoff(), 4, CutoffPolicy::HaltOnly).papers;
        let twice = top_by_stars(once.clone(), 4, |p| p.stars);

        assert_eq!(once, twice);
        assert_eq!(
            once.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
            vec!["b", "e", "a", "c"]
        );
    }

    #[test]
    fn test_cutoff_policy_parsing() {
        assert_eq!(CutoffPolicy::from_str("halt-only"), Some(CutoffPolicy::HaltOnly));
        assert_eq!(CutoffPolicy::from_str("EXCLUDE"), Some(CutoffPolicy::Exclude));
        assert_eq!(CutoffPolicy::from_str("sometimes"), None);
        assert_eq!(CutoffPolicy::Exclude.to_string(), "exclude");
        assert!("bogus".parse::<CutoffPolicy>().is_err());
    }
}
