//! Contract agreement discovery.

use std::collections::HashSet;
use std::sync::Arc;

use infergate_api::{AgreementQuery, ManagementApi};
use infergate_types::Agreement;
use infergate_types::fields::{extract_text, keys};
use infergate_util::extract_collection_items;
use tracing::{debug, warn};

use crate::InferError;
use crate::error::upstream_preview;
use crate::settings::AgreementPaging;

/// Finds the most recently signed agreement covering an asset.
#[derive(Clone)]
pub struct AgreementFinder {
    api: Arc<dyn ManagementApi>,
    paging: AgreementPaging,
}

impl AgreementFinder {
    pub fn new(api: Arc<dyn ManagementApi>, paging: AgreementPaging) -> Self {
        Self { api, paging }
    }

    /// Pages through the agreement list and returns the best match, if any.
    ///
    /// Paging stops at the first short page, at a page that repeats only
    /// agreement ids already seen, or after `max_pages` pages.
    pub async fn find_best(&self, asset_id: &str) -> Result<Option<Agreement>, InferError> {
        let page_size = self.paging.page_size.max(1);
        let mut matches = Vec::new();
        let mut seen_ids = HashSet::new();

        for page in 0..self.paging.max_pages {
            let query = AgreementQuery {
                offset: page * page_size,
                limit: page_size,
            };
            let document = self.api.query_agreements(query).await.map_err(|error| {
                warn!(
                    asset_id = %asset_id,
                    offset = query.offset,
                    error = %error,
                    upstream_body = %upstream_preview(&error),
                    "contract agreement query failed"
                );
                InferError::upstream("contract agreement query", &error)
            })?;

            let items = extract_collection_items(&document, keys::AGREEMENT_COLLECTION);
            let fetched = items.len();
            let (mut page_ids, mut new_ids) = (0usize, 0usize);
            for id in items.iter().filter_map(|item| extract_text(item, keys::AGREEMENT_ID)) {
                page_ids += 1;
                if seen_ids.insert(id) {
                    new_ids += 1;
                }
            }
            if page_ids > 0 && new_ids == 0 {
                debug!(asset_id = %asset_id, offset = query.offset, fetched, "agreement page repeats earlier ids, stopping");
                break;
            }
            matches.extend(
                items
                    .iter()
                    .filter_map(Agreement::from_document)
                    .filter(|agreement| agreement.covers(asset_id)),
            );
            debug!(asset_id = %asset_id, offset = query.offset, fetched, matched = matches.len(), "agreement page read");

            if fetched < page_size {
                break;
            }
        }

        let best = select_best(matches);
        debug!(asset_id = %asset_id, agreement_id = ?best.as_ref().map(|agreement| agreement.id.as_str()), "agreement selection finished");
        Ok(best)
    }
}

/// Picks the agreement with the greatest signing time.
///
/// Ties keep the earlier candidate. An agreement with an unknown signing time
/// is only chosen when nothing has been chosen yet.
pub fn select_best(candidates: impl IntoIterator<Item = Agreement>) -> Option<Agreement> {
    let mut best: Option<Agreement> = None;
    let mut best_rank = i64::MIN;
    for candidate in candidates {
        let rank = candidate.signed_at.rank();
        if rank > best_rank {
            best_rank = rank;
            best = Some(candidate);
        } else if best.is_none() && rank == i64::MIN {
            best = Some(candidate);
        }
    }
    best
}
