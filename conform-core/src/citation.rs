//! Projection of a result's evidence into page-addressed citations.

use crate::types::{ConformanceResult, Evidence, EvidenceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationSource {
    /// Project specification document.
    Spec,
    /// Material Index.
    Material,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationStatus {
    Match,
    Issue,
    Discrepancy,
}

impl From<EvidenceStatus> for CitationStatus {
    fn from(status: EvidenceStatus) -> Self {
        match status {
            EvidenceStatus::Match => CitationStatus::Match,
            EvidenceStatus::PotentialIssue => CitationStatus::Issue,
            EvidenceStatus::Discrepancy => CitationStatus::Discrepancy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub text: String,
    pub page_number: u32,
    pub source: CitationSource,
    pub status: CitationStatus,
}

/// Page for chunk `index`: the reference at the same index, else the first
/// reference, else page 1. Zero references count as absent.
fn page_for(evidence: &Evidence, index: usize) -> u32 {
    let valid = |page: Option<&u32>| page.copied().filter(|p| *p > 0);
    valid(evidence.page_references.get(index))
        .or_else(|| valid(evidence.page_references.first()))
        .unwrap_or(1)
}

fn push_citations(out: &mut Vec<Citation>, evidence: &[Evidence], source: CitationSource) {
    for ev in evidence {
        for (i, chunk) in ev.chunks.iter().enumerate() {
            out.push(Citation {
                text: chunk.clone(),
                page_number: page_for(ev, i),
                source,
                status: ev.status.into(),
            });
        }
    }
}

/// One citation per evidence chunk: specification evidence first, then
/// Material Index evidence, each in original order.
pub fn project(result: &ConformanceResult) -> Vec<Citation> {
    let mut citations = Vec::new();
    push_citations(&mut citations, &result.project_spec_evidence, CitationSource::Spec);
    push_citations(&mut citations, &result.material_index_evidence, CitationSource::Material);
    citations
}

/// Page-by-page navigation over a result's citations.
#[derive(Debug, Clone)]
pub struct CitationPager {
    citations: Vec<Citation>,
    page: u32,
    last_page: u32,
}

impl CitationPager {
    /// Opens the pager on `page`, clamped to the cited page range.
    pub fn new(citations: Vec<Citation>, page: u32) -> Self {
        let last_page = citations.iter().map(|c| c.page_number).max().unwrap_or(1);
        Self { citations, page: page.clamp(1, last_page), last_page }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn last_page(&self) -> u32 {
        self.last_page
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub fn on_current_page(&self) -> Vec<&Citation> {
        self.citations.iter().filter(|c| c.page_number == self.page).collect()
    }

    pub fn next_page(&mut self) {
        self.page = (self.page + 1).min(self.last_page);
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Jumps to the next page after the current one that carries a citation.
    pub fn next_cited(&mut self) {
        if let Some(page) = self
            .citations
            .iter()
            .map(|c| c.page_number)
            .filter(|p| *p > self.page)
            .min()
        {
            self.page = page;
        }
    }

    /// Jumps to the closest earlier page that carries a citation.
    pub fn prev_cited(&mut self) {
        if let Some(page) = self
            .citations
            .iter()
            .map(|c| c.page_number)
            .filter(|p| *p < self.page)
            .max()
        {
            self.page = page;
        }
    }
}
