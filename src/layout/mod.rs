//! # Page Layout Engine
//!
//! Partitions normalized records into fixed-capacity pages.
//!
//! ## Rules
//!
//! - Every page except possibly the last holds exactly
//!   `preset.labels_per_page()` cards.
//! - Page and card order match input order; nothing is re-sorted.
//! - Zero records yields zero pages (never a blank page).
//!
//! ```
//! use regalia_labels::layout::paginate;
//! use regalia_labels::preset::PaperPreset;
//! use regalia_labels::record::LabelRecord;
//!
//! let records = vec![LabelRecord::default(); 23];
//! let pages = paginate(records, &PaperPreset::SMALL_CARD);
//! let sizes: Vec<usize> = pages.iter().map(|p| p.cards.len()).collect();
//! assert_eq!(sizes, vec![9, 9, 5]);
//! ```

use std::sync::Arc;

use crate::preset::PaperPreset;
use crate::record::LabelRecord;

/// One card instance on a page.
///
/// `key` is a stable rendering identity; replicated cards share a record
/// but never a key.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub key: String,
    /// Position within the page grid (0-based, flow order).
    pub slot: usize,
    pub record: Arc<LabelRecord>,
}

/// One physical sheet's worth of cards.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 0-based page number.
    pub index: usize,
    pub cards: Vec<Card>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Chunk records into pages of the preset's capacity.
pub fn paginate(records: Vec<LabelRecord>, preset: &PaperPreset) -> Vec<Page> {
    let cards = records.into_iter().enumerate().map(|(i, record)| {
        let key = if record.id.is_empty() {
            format!("card-{}", i)
        } else {
            format!("{}-{}", record.id, i)
        };
        (key, Arc::new(record))
    });
    chunk(cards, preset.labels_per_page())
}

/// Fabricate `count` copies of one record and paginate them.
///
/// Used to print a full run of identical labels for a single bulk order.
pub fn replicate(record: LabelRecord, count: usize, preset: &PaperPreset) -> Vec<Page> {
    let base = if record.id.is_empty() {
        "copy".to_string()
    } else {
        record.id.clone()
    };
    let shared = Arc::new(record);
    let cards = (0..count).map(|i| (format!("{}-copy-{}", base, i), Arc::clone(&shared)));
    chunk(cards, preset.labels_per_page())
}

fn chunk(cards: impl Iterator<Item = (String, Arc<LabelRecord>)>, capacity: usize) -> Vec<Page> {
    let capacity = capacity.max(1);
    let mut pages: Vec<Page> = Vec::new();

    for (i, (key, record)) in cards.enumerate() {
        let slot = i % capacity;
        if slot == 0 {
            pages.push(Page {
                index: pages.len(),
                cards: Vec::with_capacity(capacity),
            });
        }
        if let Some(page) = pages.last_mut() {
            page.cards.push(Card { key, slot, record });
        }
    }

    pages
}

/// Total card instances across pages.
pub fn card_count(pages: &[Page]) -> usize {
    pages.iter().map(Page::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn records(n: usize) -> Vec<LabelRecord> {
        (0..n)
            .map(|i| LabelRecord {
                id: format!("o{}", i),
                name: format!("Name {}", i),
                ..Default::default()
            })
            .collect()
    }

    fn sizes(pages: &[Page]) -> Vec<usize> {
        pages.iter().map(Page::len).collect()
    }

    #[test]
    fn test_23_records_capacity_9() {
        let pages = paginate(records(23), &PaperPreset::SMALL_CARD);
        assert_eq!(sizes(&pages), vec![9, 9, 5]);
    }

    #[test]
    fn test_pagination_counts_for_all_presets() {
        for preset in PaperPreset::catalog() {
            let k = preset.labels_per_page();
            for n in 0..40 {
                let pages = paginate(records(n), preset);
                assert_eq!(pages.len(), n.div_ceil(k), "n={} k={}", n, k);
                for page in pages.iter().take(pages.len().saturating_sub(1)) {
                    assert_eq!(page.len(), k);
                }
                if let Some(last) = pages.last() {
                    let expected = if n % k == 0 { k } else { n % k };
                    assert_eq!(last.len(), expected);
                }
            }
        }
    }

    #[test]
    fn test_order_preserved_and_nothing_dropped() {
        let input = records(30);
        let pages = paginate(input.clone(), &PaperPreset::A4);
        let flattened: Vec<LabelRecord> = pages
            .iter()
            .flat_map(|p| p.cards.iter().map(|c| (*c.record).clone()))
            .collect();
        assert_eq!(flattened, input);
    }

    #[test]
    fn test_page_indices_and_slots() {
        let pages = paginate(records(10), &PaperPreset::A5);
        assert_eq!(pages.iter().map(|p| p.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(pages[1].cards.iter().map(|c| c.slot).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(pages[2].cards.iter().map(|c| c.slot).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_zero_records_zero_pages() {
        assert!(paginate(Vec::new(), &PaperPreset::A4).is_empty());
        assert!(replicate(LabelRecord::default(), 0, &PaperPreset::A4).is_empty());
    }

    #[test]
    fn test_replicate_25_at_capacity_4() {
        let record = LabelRecord {
            id: "X".to_string(),
            name: "Order X".to_string(),
            ..Default::default()
        };
        let pages = replicate(record.clone(), 25, &PaperPreset::A5);
        assert_eq!(sizes(&pages), vec![4, 4, 4, 4, 4, 4, 1]);
        assert_eq!(card_count(&pages), 25);

        let keys: HashSet<&str> = pages
            .iter()
            .flat_map(|p| p.cards.iter().map(|c| c.key.as_str()))
            .collect();
        assert_eq!(keys.len(), 25);

        for card in pages.iter().flat_map(|p| p.cards.iter()) {
            assert_eq!(*card.record, record);
        }
    }

    #[test]
    fn test_duplicate_ids_still_get_distinct_keys() {
        let dupes = vec![
            LabelRecord {
                id: "same".to_string(),
                ..Default::default()
            };
            3
        ];
        let pages = paginate(dupes, &PaperPreset::A4);
        let keys: HashSet<&str> = pages[0].cards.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys.len(), 3);
    }
}
