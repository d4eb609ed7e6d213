use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::database::activity_repo;
use crate::error::ServiceError;
use crate::models::ActivityRow;

// Loose-reference resolution: "that draft", "the mahjong one". An exact id
// wins unconditionally; otherwise a normalized title match with a recency
// tie-break; otherwise the newest candidate in scope.

const CANDIDATE_LIMIT: i64 = 20;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityRef {
    #[serde(default)]
    pub activity_id: Option<String>,
    #[serde(default)]
    pub title_hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionScope {
    /// The caller's drafts only.
    Drafts,
    /// Everything the caller created, any status.
    Mine,
}

impl ResolutionScope {
    fn status_filter(self) -> Option<&'static str> {
        match self {
            ResolutionScope::Drafts => Some("draft"),
            ResolutionScope::Mine => None,
        }
    }

    fn empty_hint(self) -> &'static str {
        match self {
            ResolutionScope::Drafts => "you have no drafts yet; create one first",
            ResolutionScope::Mine => "you have no activities yet; create a draft first",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlternativeRef {
    pub activity_id: String,
    pub title: String,
}

#[derive(Debug)]
pub struct ResolvedActivity {
    pub activity: ActivityRow,
    /// Other candidates that also matched the hint, newest first, so the
    /// agent can disambiguate in the next turn.
    pub alternatives: Vec<AlternativeRef>,
}

pub async fn resolve(
    pool: &SqlitePool,
    user_id: &str,
    reference: &ActivityRef,
    scope: ResolutionScope,
) -> Result<ResolvedActivity, ServiceError> {
    let candidates = activity_repo::list_resolution_candidates(
        pool,
        user_id,
        scope.status_filter(),
        CANDIDATE_LIMIT,
    )
    .await?;
    if candidates.is_empty() {
        return Err(ServiceError::NotFound(scope.empty_hint().to_string()));
    }

    // 1. Exact id beats everything, including a contradictory hint.
    if let Some(id) = reference.activity_id.as_deref() {
        if let Some(hit) = candidates.iter().find(|c| c.activity_id == id) {
            return Ok(ResolvedActivity {
                activity: hit.clone(),
                alternatives: Vec::new(),
            });
        }
        return Err(ServiceError::NotFound(format!(
            "activity {id} is not among your recent candidates"
        )));
    }

    // 2. Normalized title containment, either direction.
    let hint = reference
        .title_hint
        .as_deref()
        .map(normalize_for_match)
        .filter(|h| !h.is_empty());
    if let Some(hint) = hint {
        let matches: Vec<&ActivityRow> = candidates
            .iter()
            .filter(|c| {
                let title = normalize_for_match(&c.title);
                title.contains(&hint) || hint.contains(&title)
            })
            .collect();
        if let Some((first, rest)) = matches.split_first() {
            // Candidates arrive newest-first, so the head is the recency winner.
            let alternatives = rest
                .iter()
                .map(|c| AlternativeRef {
                    activity_id: c.activity_id.clone(),
                    title: c.title.clone(),
                })
                .collect();
            return Ok(ResolvedActivity {
                activity: (*first).clone(),
                alternatives,
            });
        }
        return Err(ServiceError::NotFound(format!(
            "nothing in your recent activities matches '{}'",
            reference.title_hint.as_deref().unwrap_or_default()
        )));
    }

    // 3. No reference at all: the most recently created candidate.
    Ok(ResolvedActivity {
        activity: candidates[0].clone(),
        alternatives: Vec::new(),
    })
}

/// Strips pictographic symbols and whitespace padding, then casefolds.
/// "🀄️ 观音桥麻将局" and "麻将" end up comparable.
pub fn normalize_for_match(input: &str) -> String {
    input
        .chars()
        .filter(|c| !is_pictographic(*c))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

fn is_pictographic(c: char) -> bool {
    let cp = c as u32;
    matches!(cp,
        0x1F000..=0x1FAFF // emoji, mahjong tiles, playing cards, symbols
        | 0x2600..=0x27BF // misc symbols and dingbats
        | 0x2B00..=0x2BFF // arrows and stars used as emoji
        | 0x2300..=0x23FF // misc technical (watch, hourglass)
        | 0xFE00..=0xFE0F // variation selectors
        | 0x200D          // zero-width joiner
        | 0x20E3          // combining enclosing keycap
    )
}
